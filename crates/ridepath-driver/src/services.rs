//! Service container for the driver screens
//!
//! Built once at startup from the backend seams and the durable store, then
//! handed to each screen. Screens get fresh controllers; the ETA cache and the
//! backend clients are shared.

use crate::chat::ChatPoller;
use crate::resolver::RouteCitiesResolver;
use crate::setup::RouteSetupForm;
use crate::traversal::RouteTraversal;
use ridepath_cache::{EtaCache, KeyValueStore};
use ridepath_core::{ChatApi, ChatMessage, Clock, Conversation, DriverApi, RidepathConfig};
use std::fmt;
use std::sync::Arc;

/// Shared dependencies of the driver services
#[derive(Clone)]
pub struct DriverServices {
    api: Arc<dyn DriverApi>,
    chat: Arc<dyn ChatApi>,
    cache: EtaCache,
    clock: Arc<dyn Clock>,
    config: RidepathConfig,
}

impl DriverServices {
    /// Wire the services together
    #[must_use]
    pub fn new(
        api: Arc<dyn DriverApi>,
        chat: Arc<dyn ChatApi>,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: RidepathConfig,
    ) -> Self {
        let cache = EtaCache::new(store, clock.clone()).with_ttl(config.cache.ttl());
        Self {
            api,
            chat,
            cache,
            clock,
            config,
        }
    }

    /// Resolver for the navigation header
    #[must_use]
    pub fn resolver(&self) -> RouteCitiesResolver {
        RouteCitiesResolver::new(self.api.clone(), self.cache.clone())
    }

    /// Fresh traversal for the navigation screen
    #[must_use]
    pub fn traversal(&self) -> RouteTraversal {
        RouteTraversal::new(self.api.clone(), self.clock.clone())
    }

    /// Empty route setup form
    #[must_use]
    pub fn route_setup(&self) -> RouteSetupForm {
        RouteSetupForm::new(self.api.clone(), &self.config.setup)
    }

    /// Conversation list poller
    #[must_use]
    pub fn chat_list(&self) -> ChatPoller<Vec<Conversation>> {
        ChatPoller::conversations(self.chat.clone(), self.config.chat.list_interval())
    }

    /// Message poller for one conversation
    #[must_use]
    pub fn chat_room(&self, conversation_id: i64) -> ChatPoller<Vec<ChatMessage>> {
        ChatPoller::messages(
            self.chat.clone(),
            conversation_id,
            self.config.chat.room_interval(),
        )
    }

    #[must_use]
    pub fn eta_cache(&self) -> &EtaCache {
        &self.cache
    }

    #[must_use]
    pub fn config(&self) -> &RidepathConfig {
        &self.config
    }
}

impl fmt::Debug for DriverServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverServices")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridepath_cache::MemoryStore;
    use ridepath_test_utils::{FakeChatApi, FakeDriverApi, ManualClock};
    use std::time::Duration;

    fn services(config: RidepathConfig) -> DriverServices {
        DriverServices::new(
            Arc::new(FakeDriverApi::new()),
            Arc::new(FakeChatApi::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_secs(0)),
            config,
        )
    }

    #[test]
    fn cache_ttl_follows_config() {
        let mut config = RidepathConfig::default();
        config.cache.ttl_days = 2;

        let services = services(config);

        assert_eq!(services.eta_cache().ttl(), Duration::from_secs(2 * 24 * 60 * 60));
    }

    #[test]
    fn chat_pollers_use_configured_intervals() {
        let services = services(RidepathConfig::default());

        assert_eq!(services.chat_list().interval(), Duration::from_secs(5));
        assert_eq!(services.chat_room(3).interval(), Duration::from_secs(3));
    }

    #[test]
    fn each_screen_gets_a_fresh_controller() {
        let services = services(RidepathConfig::default());
        let form = services.route_setup();
        form.add_city(ridepath_test_utils::city(1, "A"));

        assert!(services.route_setup().selected_cities().is_empty());
        assert_eq!(services.traversal().current_index(), 0);
    }
}
