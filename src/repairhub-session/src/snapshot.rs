//! Observable session state.

use repairhub_protocol::{DisconnectNotice, Identity, LifecycleState, TrustLevel};
use serde::Serialize;

/// Point-in-time view of a tab's session, published over a watch channel.
///
/// The countdown here is the authoritative one: the UI renders it and
/// never runs a timer of its own, so the visible number cannot drift from
/// the underlying expiry schedule by more than one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Current lifecycle state.
    pub lifecycle: LifecycleState,
    /// The authenticated identity, when one is held.
    pub identity: Option<Identity>,
    /// Trust level of the held identity.
    pub trust: Option<TrustLevel>,
    /// Seconds left in the warning countdown; present only in
    /// [`LifecycleState::Warning`].
    pub countdown_seconds: Option<u64>,
    /// Notice from the most recent forced teardown, retained after the
    /// collapse to unauthenticated so late subscribers still render it.
    pub notice: Option<DisconnectNotice>,
}

impl SessionSnapshot {
    /// Whether a session is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.lifecycle.is_authenticated()
    }
}
