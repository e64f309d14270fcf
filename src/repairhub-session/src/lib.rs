//! Session lifecycle controller for the RepairHub dashboard.
//!
//! Each tab owns exactly one [`SessionController`]. It composes the
//! credential gateway, the token vault, the session clock and the
//! revocation bus into the state machine
//! `UNAUTHENTICATED -> ACTIVE -> WARNING -> EXPIRED`, with a terminal
//! `REVOKED` that can interrupt an authenticated session at any moment.
//! Expired and revoked sessions collapse back to `UNAUTHENTICATED` after
//! cleanup; the only way out of `UNAUTHENTICATED` is a successful login.
//!
//! Consumers observe the controller through a `tokio::sync::watch`
//! channel of [`SessionSnapshot`]s: lifecycle state, identity, trust
//! level, the authoritative warning countdown and any teardown notice.
//! The UI is a pure subscriber - it owns no timers of its own.

pub mod clock;
pub mod controller;
pub mod error;
pub mod snapshot;

// Re-export main types at crate root
pub use controller::SessionController;
pub use error::{Result, SessionError};
pub use snapshot::SessionSnapshot;

// Protocol types callers need alongside the controller
pub use repairhub_protocol::{
    ActivityKind, DisconnectNotice, DisconnectReason, Identity, LifecycleState, SessionPolicy,
    StaffRole, TrustLevel, has_capability,
};
