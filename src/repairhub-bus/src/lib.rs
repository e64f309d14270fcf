//! Cross-tab message bus for the RepairHub session core.
//!
//! One tab's write to a shared store slot becomes, asynchronously, a
//! notification in every sibling tab. This crate wraps that mechanism in a
//! small publish/subscribe surface: [`StorageBus`] is the generic
//! topic-keyed bus (a topic is a slot key), and [`RevocationBus`] is the
//! typed channel administrative actions use to invalidate an account's
//! sessions in every open tab.
//!
//! Delivery is best-effort and at-least-once: no acknowledgment, no retry,
//! no replay for subscribers that attach after a write. A tab opened after
//! a revocation discovers it through token-store rehydration, not the bus.

pub mod bus;
pub mod error;
pub mod revocation;

// Re-export main types at crate root
pub use bus::{BusSubscription, StorageBus, TopicHandler};
pub use error::{BusError, Result};
pub use revocation::{RevocationBus, RevocationHandler};
