//! Capability evaluation.

use crate::identity::{Identity, StaffRole};

/// Check whether an identity holds a capability.
///
/// Super admins bypass the capability set unconditionally; everyone else
/// needs exact membership. Pure function, no I/O.
pub fn has_capability(identity: &Identity, capability: &str) -> bool {
    if identity.role == StaffRole::SuperAdmin {
        return true;
    }
    identity.capabilities.contains(capability)
}
