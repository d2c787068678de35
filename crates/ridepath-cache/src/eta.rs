//! Single-slot ETA cache
//!
//! Holds one `EtaCacheEntry` under a fixed key. An entry is served only for
//! the city pair it was written for and only while younger than the TTL;
//! anything else is purged on read.

use crate::store::KeyValueStore;
use ridepath_core::{CityId, Clock, EtaCacheEntry, NewEtaCacheEntry};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Store key of the cached entry
pub const ETA_CACHE_KEY: &str = "route_eta_cache";

/// Default entry lifetime (7 days)
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Durable ETA cache for the driver's current city pair
///
/// Every storage failure is logged and treated as a miss.
#[derive(Clone)]
pub struct EtaCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl EtaCache {
    /// Create cache with the default TTL
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl: DEFAULT_TTL,
        }
    }

    /// With entry lifetime
    #[inline]
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Entry lifetime
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get the entry for a city pair
    ///
    /// Returns `None` and purges the stored value when it belongs to another
    /// pair, is expired, or cannot be parsed.
    pub async fn get(&self, start_city_id: CityId, end_city_id: CityId) -> Option<EtaCacheEntry> {
        let raw = match self.store.get(ETA_CACHE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("ETA cache empty");
                return None;
            }
            Err(e) => {
                tracing::warn!("ETA cache read failed: {}", e);
                return None;
            }
        };

        let entry: EtaCacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("ETA cache entry unreadable, purging: {}", e);
                self.purge().await;
                return None;
            }
        };

        if !entry.matches(start_city_id, end_city_id) {
            tracing::debug!(
                "ETA cache holds {} -> {}, requested {} -> {}; purging",
                entry.start_city_id,
                entry.end_city_id,
                start_city_id,
                end_city_id
            );
            self.purge().await;
            return None;
        }

        let Some(age_ms) = self.clock.now_millis().checked_sub(entry.timestamp) else {
            tracing::warn!("ETA cache timestamp {} out of range, purging", entry.timestamp);
            self.purge().await;
            return None;
        };
        if age_ms >= self.ttl_millis() {
            tracing::debug!("ETA cache entry expired ({} ms old); purging", age_ms);
            self.purge().await;
            return None;
        }

        tracing::debug!("ETA cache hit for {} -> {}", start_city_id, end_city_id);
        Some(entry)
    }

    /// Store an entry stamped with the current time, replacing any other
    pub async fn put(&self, entry: NewEtaCacheEntry) {
        let entry = entry.stamp(self.clock.now_millis());
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("ETA cache entry not serializable: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(ETA_CACHE_KEY, &raw).await {
            tracing::warn!("ETA cache write failed: {}", e);
        }
    }

    /// Drop the cached entry
    pub async fn invalidate(&self) {
        self.purge().await;
    }

    async fn purge(&self) {
        if let Err(e) = self.store.remove(ETA_CACHE_KEY).await {
            tracing::warn!("ETA cache purge failed: {}", e);
        }
    }

    fn ttl_millis(&self) -> i64 {
        i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX)
    }
}

impl fmt::Debug for EtaCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EtaCache")
            .field("key", &ETA_CACHE_KEY)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use pretty_assertions::assert_eq;
    use ridepath_test_utils::ManualClock;

    const WEEK_MS: i64 = 7 * 24 * 3600 * 1000;
    const NOW_MS: i64 = 1_700_000_000_000;

    fn entry(start: CityId, end: CityId) -> NewEtaCacheEntry {
        NewEtaCacheEntry {
            start_city_id: start,
            end_city_id: end,
            start_city: "Start".to_string(),
            end_city: "End".to_string(),
            eta_minutes: 45,
            distance_km: 12.3,
        }
    }

    fn cache() -> (EtaCache, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_millis(NOW_MS));
        (EtaCache::new(store.clone(), clock.clone()), store, clock)
    }

    async fn seed(store: &MemoryStore, entry: &EtaCacheEntry) {
        store
            .set(ETA_CACHE_KEY, &serde_json::to_string(entry).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn put_then_get_same_pair() {
        let (cache, _, _) = cache();
        cache.put(entry(1, 2)).await;

        let hit = cache.get(1, 2).await.unwrap();
        assert_eq!(hit.eta_minutes, 45);
        assert_eq!(hit.timestamp, NOW_MS);
    }

    #[tokio::test]
    async fn expired_entry_is_absent_and_purged() {
        let (cache, store, _) = cache();
        seed(&store, &entry(1, 2).stamp(NOW_MS - WEEK_MS - 1)).await;

        assert!(cache.get(1, 2).await.is_none());
        assert!(store.is_empty());
        assert!(cache.get(1, 2).await.is_none());
    }

    #[tokio::test]
    async fn entry_exactly_one_ttl_old_is_expired() {
        let (cache, store, _) = cache();
        seed(&store, &entry(1, 2).stamp(NOW_MS - WEEK_MS)).await;
        assert!(cache.get(1, 2).await.is_none());
    }

    #[tokio::test]
    async fn entry_just_inside_ttl_is_served() {
        let (cache, store, _) = cache();
        seed(&store, &entry(1, 2).stamp(NOW_MS - WEEK_MS + 1)).await;
        assert!(cache.get(1, 2).await.is_some());
    }

    #[tokio::test]
    async fn mismatched_pair_purges_entry() {
        let (cache, store, _) = cache();
        cache.put(entry(1, 2)).await;

        assert!(cache.get(1, 3).await.is_none());
        assert!(store.is_empty());
        assert!(cache.get(1, 2).await.is_none());
    }

    #[tokio::test]
    async fn put_overwrites_single_slot() {
        let (cache, store, clock) = cache();
        cache.put(entry(1, 2)).await;
        clock.advance(ChronoDuration::minutes(5));
        cache.put(entry(3, 4)).await;

        assert_eq!(store.len(), 1);
        let hit = cache.get(3, 4).await.unwrap();
        assert_eq!(hit.timestamp, NOW_MS + 5 * 60 * 1000);
    }

    #[tokio::test]
    async fn entry_expires_as_clock_advances() {
        let (cache, _, clock) = cache();
        cache.put(entry(1, 2)).await;

        clock.advance(ChronoDuration::days(6));
        assert!(cache.get(1, 2).await.is_some());

        clock.advance(ChronoDuration::days(1));
        assert!(cache.get(1, 2).await.is_none());
    }

    #[tokio::test]
    async fn custom_ttl_applies() {
        let (cache, _, clock) = cache();
        let cache = cache.with_ttl(Duration::from_secs(60));
        cache.put(entry(1, 2)).await;

        clock.advance(ChronoDuration::seconds(61));
        assert!(cache.get(1, 2).await.is_none());
    }

    #[tokio::test]
    async fn corrupt_value_is_a_miss() {
        let (cache, store, _) = cache();
        store.set(ETA_CACHE_KEY, "{not json").await.unwrap();

        assert!(cache.get(1, 2).await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn out_of_range_timestamp_is_a_miss() {
        let (cache, store, _) = cache();
        seed(&store, &entry(1, 2).stamp(i64::MIN)).await;

        assert!(cache.get(1, 2).await.is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn invalidate_clears() {
        let (cache, store, _) = cache();
        cache.put(entry(1, 2)).await;
        cache.invalidate().await;

        assert!(store.is_empty());
        assert!(cache.get(1, 2).await.is_none());
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("locked".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("locked".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("locked".to_string()))
        }
    }

    #[tokio::test]
    async fn broken_store_fails_open() {
        let cache = EtaCache::new(Arc::new(BrokenStore), Arc::new(ManualClock::at_millis(NOW_MS)));

        cache.put(entry(1, 2)).await;
        cache.invalidate().await;
        assert!(cache.get(1, 2).await.is_none());
    }
}
