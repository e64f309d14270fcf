//! Shared key-value store and token vault for the RepairHub session core.
//!
//! Every browser tab of one origin shares a single string-keyed slot store
//! with last-write-wins semantics and a change feed delivered to every tab
//! except the writer. This crate abstracts that surface behind the
//! [`SharedStore`] trait, ships an in-memory implementation
//! ([`MemoryStore`]) whose per-tab handles behave like sibling tabs, and
//! builds the [`TokenVault`] - the persistence layer for identity and
//! token slots - on top of it.
//!
//! The store is the only state shared across tabs. It has no lock: writers
//! tolerate last-write-wins and readers are defensive about partial or
//! stale values.

pub mod error;
pub mod keys;
pub mod memory;
pub mod shared;
pub mod vault;

// Re-export main types at crate root
pub use error::{Result, StoreError};
pub use memory::{MemoryStore, TabStore};
pub use shared::{SharedStore, StoreChange, StoreSubscription};
pub use vault::{StoredCredentials, TokenVault};
