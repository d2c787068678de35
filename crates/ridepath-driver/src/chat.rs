//! Chat polling
//!
//! Chat screens refresh by polling while focused: the conversation list
//! every 5 s, an open room every 3 s. `focus()` starts the loop with an
//! immediate fetch, `blur()` cancels it. Fetch failures are logged and the
//! last good snapshot stays published.

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use ridepath_core::{ApiError, ChatApi, ChatMessage, Conversation};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

type Fetch<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

/// Focus-driven poller publishing the latest snapshot of a chat resource
pub struct ChatPoller<T> {
    name: &'static str,
    interval: Duration,
    fetch: Fetch<T>,
    tx: Arc<watch::Sender<Option<T>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChatPoller<Vec<Conversation>> {
    /// Poller for the conversation list
    #[must_use]
    pub fn conversations(api: Arc<dyn ChatApi>, interval: Duration) -> Self {
        Self::new("chat-list", interval, move || {
            let api = api.clone();
            async move { api.conversations().await }.boxed()
        })
    }
}

impl ChatPoller<Vec<ChatMessage>> {
    /// Poller for the messages of one conversation
    #[must_use]
    pub fn messages(api: Arc<dyn ChatApi>, conversation_id: i64, interval: Duration) -> Self {
        Self::new("chat-room", interval, move || {
            let api = api.clone();
            async move { api.messages(conversation_id).await }.boxed()
        })
    }
}

impl<T> ChatPoller<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new<F>(name: &'static str, interval: Duration, fetch: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync + 'static,
    {
        let (tx, _rx) = watch::channel(None);
        Self {
            name,
            interval,
            fetch: Arc::new(fetch),
            tx: Arc::new(tx),
            task: Mutex::new(None),
        }
    }

    /// Start polling; `false` if already polling or outside a Tokio runtime
    pub fn focus(&self) -> bool {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return false;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("{}: no runtime, polling not started", self.name);
            return false;
        };

        let name = self.name;
        let period = self.interval.max(Duration::from_millis(1));
        let fetch = self.fetch.clone();
        let tx = self.tx.clone();

        tracing::debug!("{}: polling every {:?}", name, period);
        *task = Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match fetch().await {
                    Ok(snapshot) => {
                        tx.send_replace(Some(snapshot));
                    }
                    Err(e) => tracing::warn!("{}: poll failed: {}", name, e),
                }
            }
        }));
        true
    }

    /// Stop polling; the last snapshot stays available
    pub fn blur(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            tracing::debug!("{}: polling stopped", self.name);
        }
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Receiver notified on every successful poll
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.tx.subscribe()
    }

    /// Latest snapshot, `None` before the first successful poll
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<T> Drop for ChatPoller<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

impl<T> fmt::Debug for ChatPoller<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatPoller")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
