//! Generic topic-keyed bus over the shared store's change feed.

use std::sync::Arc;

use async_trait::async_trait;
use repairhub_store::SharedStore;
use tokio::task::JoinHandle;

use crate::error::Result;

/// Handler invoked for every matching topic write from a sibling tab.
#[async_trait]
pub trait TopicHandler: Send + Sync {
    /// Handle a message. `payload` is `None` when the slot was removed.
    async fn on_message(&self, topic: &str, payload: Option<&str>);
}

/// Publish/subscribe over shared store slots.
///
/// A topic is a slot key. Publishing overwrites the slot; subscribing
/// spawns a dispatcher that forwards every sibling-tab write to the
/// handler. The publishing tab never hears its own writes.
pub struct StorageBus {
    store: Arc<dyn SharedStore>,
}

impl StorageBus {
    /// Create a bus over a tab's store handle.
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Overwrite a topic's slot. At-least-once, best-effort: no
    /// acknowledgment and no retry.
    pub async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.store.set(topic, payload).await?;
        Ok(())
    }

    /// Subscribe a handler to a set of topics (an empty set means all).
    ///
    /// Dispatch runs on a spawned task; dropping the returned subscription
    /// stops it.
    pub fn subscribe(
        &self,
        topics: impl IntoIterator<Item = String>,
        handler: Arc<dyn TopicHandler>,
    ) -> BusSubscription {
        let topics: Vec<String> = topics.into_iter().collect();
        let mut feed = self.store.subscribe();

        let handle = tokio::spawn(async move {
            while let Some(change) = feed.changed().await {
                if !topics.is_empty() && !topics.iter().any(|t| t == &change.key) {
                    continue;
                }
                handler.on_message(&change.key, change.value.as_deref()).await;
            }
            tracing::debug!("store change feed closed, bus dispatcher exiting");
        });

        BusSubscription { handle }
    }
}

/// Handle to a running bus dispatcher. Dropping it stops dispatch.
pub struct BusSubscription {
    handle: JoinHandle<()>,
}

impl BusSubscription {
    /// Stop dispatching.
    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for BusSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
