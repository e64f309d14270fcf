//! The slot keys the session core persists under.
//!
//! All tabs of one origin read and write these exact keys; changing one is
//! a breaking change for every open tab.

/// Serialized [`Identity`](repairhub_protocol::Identity) blob, written last
/// on save and removed first on clear. Readers treat its presence as the
/// completeness gate for the other slots.
pub const IDENTITY_KEY: &str = "repairhub.identity";

/// Short-lived bearer access token.
pub const ACCESS_TOKEN_KEY: &str = "repairhub.access_token";

/// Long-lived refresh token.
pub const REFRESH_TOKEN_KEY: &str = "repairhub.refresh_token";

/// Revocation slot: a serialized
/// [`RevocationSignal`](repairhub_protocol::RevocationSignal), last-write-wins,
/// never deleted.
pub const REVOCATION_KEY: &str = "repairhub.revocation";
