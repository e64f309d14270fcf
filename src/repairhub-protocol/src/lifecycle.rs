//! Session lifecycle states and teardown notices.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the session owned by one tab.
///
/// `Expired` and `Revoked` are transient: after cleanup the controller
/// collapses both back to `Unauthenticated`. The only way out of
/// `Unauthenticated` is a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No session; tokens cleared.
    #[default]
    Unauthenticated,
    /// Authenticated, idle timers armed.
    Active,
    /// Final warning window, countdown visible.
    Warning,
    /// Idle timeout elapsed; teardown in progress.
    Expired,
    /// Revocation signal received; teardown in progress.
    Revoked,
}

impl LifecycleState {
    /// Whether a session is currently held.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LifecycleState::Active | LifecycleState::Warning)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Unauthenticated => write!(f, "unauthenticated"),
            LifecycleState::Active => write!(f, "active"),
            LifecycleState::Warning => write!(f, "warning"),
            LifecycleState::Expired => write!(f, "expired"),
            LifecycleState::Revoked => write!(f, "revoked"),
        }
    }
}

/// Why a session was torn down without the user asking for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    /// The idle timeout ran out.
    InactivityTimeout,
    /// An administrator disabled the account.
    RevokedByAdministrator,
}

/// User-facing notice describing a forced teardown.
///
/// Retained in the session snapshot after the collapse to
/// `Unauthenticated` so a late subscriber still renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnectNotice {
    /// What ended the session.
    pub reason: DisconnectReason,
    /// Whether the UI must navigate back to the login entry point.
    pub redirect_to_login: bool,
}

impl DisconnectNotice {
    /// Notice for a natural inactivity expiry.
    pub fn inactivity() -> Self {
        Self {
            reason: DisconnectReason::InactivityTimeout,
            redirect_to_login: false,
        }
    }

    /// Notice for an administrative revocation. Always forces navigation.
    pub fn revoked() -> Self {
        Self {
            reason: DisconnectReason::RevokedByAdministrator,
            redirect_to_login: true,
        }
    }

    /// Message shown to the user.
    pub fn message(&self) -> &'static str {
        match self.reason {
            DisconnectReason::InactivityTimeout => {
                "Your session expired due to inactivity. Please sign in again."
            }
            DisconnectReason::RevokedByAdministrator => {
                "Your account has been disabled by an administrator."
            }
        }
    }
}
