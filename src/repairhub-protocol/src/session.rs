//! The in-memory session held by one tab.

use secrecy::{ExposeSecret, SecretString};

use crate::identity::{Identity, TrustLevel};

/// An authenticated session: identity plus bearer tokens.
///
/// Tokens are wrapped in [`SecretString`] so they never leak through
/// `Debug` output or logs; raw strings appear only at the storage and wire
/// boundaries. The serialized identity blob deliberately excludes both
/// tokens - they persist in their own store slots.
#[derive(Debug, Clone)]
pub struct Session {
    /// The authenticated identity.
    pub identity: Identity,
    /// How much this tab trusts the identity.
    pub trust: TrustLevel,
    access_token: SecretString,
    refresh_token: Option<SecretString>,
}

impl Session {
    /// Create a verified session from a login or refresh exchange.
    pub fn new(identity: Identity, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            identity,
            trust: TrustLevel::Verified,
            access_token: SecretString::from(access_token),
            refresh_token: refresh_token.map(SecretString::from),
        }
    }

    /// Mark the session as adopted from cache without reverification.
    pub fn with_trust(mut self, trust: TrustLevel) -> Self {
        self.trust = trust;
        self
    }

    /// The opaque user identifier.
    pub fn subject(&self) -> &str {
        &self.identity.subject
    }

    /// The bearer access token (exposes the secret - use sparingly).
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// The refresh token, if one was issued.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret())
    }

    /// Replace the access token after a successful refresh.
    pub fn set_access_token(&mut self, access_token: String) {
        self.access_token = SecretString::from(access_token);
    }

    /// Replace the identity after a profile update, keeping tokens.
    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaffRole;

    fn session() -> Session {
        Session::new(
            Identity::new(
                "user-1",
                "Jo",
                "jo@shop.test",
                StaffRole::StandardUser,
                ["manage_repairs".to_string()],
            ),
            "access-1".to_string(),
            Some("refresh-1".to_string()),
        )
    }

    #[test]
    fn test_token_accessors() {
        let session = session();
        assert_eq!(session.access_token(), "access-1");
        assert_eq!(session.refresh_token(), Some("refresh-1"));
        assert_eq!(session.subject(), "user-1");
        assert_eq!(session.trust, TrustLevel::Verified);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", session());
        assert!(!rendered.contains("access-1"));
        assert!(!rendered.contains("refresh-1"));
    }

    #[test]
    fn test_refresh_replaces_only_access_token() {
        let mut session = session();
        session.set_access_token("access-2".to_string());
        assert_eq!(session.access_token(), "access-2");
        assert_eq!(session.refresh_token(), Some("refresh-1"));
    }
}
