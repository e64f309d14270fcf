//! In-memory shared store.
//!
//! One [`MemoryStore`] stands in for a browser origin; each
//! [`TabStore`] handle opened from it behaves like one tab. Handles share
//! the same slots and announce their writes to every other handle, which
//! is exactly the surface the session controller and revocation bus are
//! built against in tests and headless embeddings.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::error::Result;
use crate::shared::{SharedStore, StoreChange, StoreSubscription, TaggedChange};

/// Capacity of the change feed. Slow subscribers lag rather than block
/// writers, matching the fire-and-forget nature of storage events.
const CHANGE_FEED_CAPACITY: usize = 64;

struct StoreInner {
    slots: RwLock<HashMap<String, String>>,
    changes: broadcast::Sender<TaggedChange>,
}

/// An in-memory store shared by a set of simulated tabs.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                slots: RwLock::new(HashMap::new()),
                changes,
            }),
        }
    }

    /// Open a new tab handle onto this store.
    ///
    /// Each handle has its own identity: it observes every other handle's
    /// writes through [`SharedStore::subscribe`] but never its own.
    pub fn open_tab(&self) -> TabStore {
        TabStore {
            inner: Arc::clone(&self.inner),
            tab_id: Uuid::new_v4(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// One tab's handle onto a [`MemoryStore`].
#[derive(Clone)]
pub struct TabStore {
    inner: Arc<StoreInner>,
    tab_id: Uuid,
}

impl TabStore {
    fn announce(&self, key: &str, value: Option<&str>) {
        let tagged = TaggedChange {
            writer: self.tab_id,
            change: StoreChange {
                key: key.to_string(),
                value: value.map(|v| v.to_string()),
            },
        };
        // No receivers is fine: nobody is listening yet.
        let _ = self.inner.changes.send(tagged);
    }
}

#[async_trait]
impl SharedStore for TabStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.slots.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner
            .slots
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.announce(key, Some(value));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let removed = self.inner.slots.write().await.remove(key);
        if removed.is_some() {
            self.announce(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> StoreSubscription {
        StoreSubscription::new(self.inner.changes.subscribe(), self.tab_id)
    }
}
