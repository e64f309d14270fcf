//! Typed revocation channel over the storage bus.

use std::sync::Arc;

use async_trait::async_trait;
use repairhub_protocol::RevocationSignal;
use repairhub_store::{SharedStore, keys::REVOCATION_KEY};
use tokio::sync::Mutex;

use crate::bus::{BusSubscription, StorageBus, TopicHandler};
use crate::error::Result;

/// Handler invoked once per distinct revocation signal from a sibling tab.
#[async_trait]
pub trait RevocationHandler: Send + Sync {
    /// A sibling tab announced that `signal.target_subject` is now invalid.
    async fn on_revocation(&self, signal: RevocationSignal);
}

/// Broadcasts and receives [`RevocationSignal`]s between tabs.
///
/// The signal lives in a single last-write-wins slot that is never
/// deleted; repeated deliveries of the same record are deduplicated by the
/// subscriber using the signal's issue timestamp. Tabs that were not
/// listening at publish time never see the signal here - they are blocked
/// by token reverification on their next initialization instead.
pub struct RevocationBus {
    bus: StorageBus,
}

impl RevocationBus {
    /// Create a revocation bus over a tab's store handle.
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self {
            bus: StorageBus::new(store),
        }
    }

    /// Announce a revocation to every other open tab. Best-effort.
    pub async fn publish(&self, signal: &RevocationSignal) -> Result<()> {
        let payload = serde_json::to_string(signal)?;
        self.bus.publish(REVOCATION_KEY, &payload).await
    }

    /// Subscribe to revocation signals published by sibling tabs.
    pub fn subscribe(&self, handler: Arc<dyn RevocationHandler>) -> BusSubscription {
        self.bus.subscribe(
            [REVOCATION_KEY.to_string()],
            Arc::new(DedupAdapter {
                handler,
                last_seen: Mutex::new(None),
            }),
        )
    }
}

/// Decodes slot payloads and drops exact redeliveries.
struct DedupAdapter {
    handler: Arc<dyn RevocationHandler>,
    last_seen: Mutex<Option<RevocationSignal>>,
}

#[async_trait]
impl TopicHandler for DedupAdapter {
    async fn on_message(&self, _topic: &str, payload: Option<&str>) {
        let Some(payload) = payload else {
            // The slot is never deleted in normal operation; a removal
            // carries no signal to act on.
            return;
        };

        let signal: RevocationSignal = match serde_json::from_str(payload) {
            Ok(signal) => signal,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable revocation record, ignoring");
                return;
            }
        };

        {
            let mut last_seen = self.last_seen.lock().await;
            if last_seen.as_ref() == Some(&signal) {
                tracing::debug!(
                    subject = %signal.target_subject,
                    "duplicate revocation delivery, ignoring"
                );
                return;
            }
            *last_seen = Some(signal.clone());
        }

        self.handler.on_revocation(signal).await;
    }
}
