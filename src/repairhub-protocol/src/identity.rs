//! Staff identity and role types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Role of a staff member within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Regular dashboard user.
    StandardUser,
    /// Tenant administrator.
    Admin,
    /// Platform-wide administrator with an unconditional capability bypass.
    SuperAdmin,
    /// Staff member acting under delegated permissions.
    DelegatedStaff,
}

impl StaffRole {
    /// Whether logins for this role go through the admin portal endpoint.
    pub fn uses_admin_portal(&self) -> bool {
        matches!(self, StaffRole::Admin | StaffRole::SuperAdmin)
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffRole::StandardUser => write!(f, "standard_user"),
            StaffRole::Admin => write!(f, "admin"),
            StaffRole::SuperAdmin => write!(f, "super_admin"),
            StaffRole::DelegatedStaff => write!(f, "delegated_staff"),
        }
    }
}

/// How much the current tab trusts a session's identity.
///
/// A session minted by a fresh login or a successful profile round trip is
/// `Verified`. A session rehydrated from the shared store while the backend
/// was unreachable is `CachedUnverified`: the identity is adopted as-is so
/// the user keeps working, and embedders can gate sensitive surfaces on
/// this value if they choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// Identity confirmed by the backend this tab lifetime.
    Verified,
    /// Identity adopted from the shared store without reverification.
    CachedUnverified,
}

/// An authenticated staff identity.
///
/// This is the serialized form persisted in the shared store's identity
/// slot - tokens are never part of it, they live in their own slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque user identifier.
    pub subject: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Login email.
    pub email: String,
    /// Assigned role.
    pub role: StaffRole,
    /// Granted permission tokens.
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
}

impl Identity {
    /// Create an identity with the given capabilities.
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        role: StaffRole,
        capabilities: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            email: email.into(),
            role,
            capabilities: capabilities.into_iter().collect(),
        }
    }
}
