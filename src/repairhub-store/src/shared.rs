//! The shared store abstraction.

use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::Result;

/// A change applied to the shared store, as observed by a sibling tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    /// The slot key that changed.
    pub key: String,
    /// The new value, or `None` when the slot was removed.
    pub value: Option<String>,
}

/// A change tagged with the handle that wrote it, for self-filtering.
#[derive(Debug, Clone)]
pub(crate) struct TaggedChange {
    pub(crate) writer: Uuid,
    pub(crate) change: StoreChange,
}

/// A string-keyed slot store shared by every tab of one origin.
///
/// Semantics mirror browser local storage: last write wins, no
/// transactions, and every write or removal is announced to all *other*
/// handles through [`SharedStore::subscribe`]. The writer never hears its
/// own changes.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Read a slot.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a slot, replacing any existing value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a slot. Removing an absent slot is a no-op.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Subscribe to changes made by other handles, from this point on.
    /// Changes written before the subscription existed are never replayed.
    fn subscribe(&self) -> StoreSubscription;
}

/// A live feed of sibling-tab store changes.
///
/// Wraps a broadcast receiver and skips changes written by the owning
/// handle. Slow consumers may miss intermediate changes (the feed is
/// lag-tolerant, not a journal); the final state is always readable from
/// the store itself.
pub struct StoreSubscription {
    rx: broadcast::Receiver<TaggedChange>,
    self_id: Uuid,
}

impl StoreSubscription {
    pub(crate) fn new(rx: broadcast::Receiver<TaggedChange>, self_id: Uuid) -> Self {
        Self { rx, self_id }
    }

    /// Wait for the next change made by a sibling handle.
    ///
    /// Returns `None` once the store has been dropped and no more changes
    /// can arrive.
    pub async fn changed(&mut self) -> Option<StoreChange> {
        loop {
            match self.rx.recv().await {
                Ok(tagged) if tagged.writer == self.self_id => continue,
                Ok(tagged) => return Some(tagged.change),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "store change feed lagged, changes dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
