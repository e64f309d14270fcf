//! Error types for repairhub-gateway.

use thiserror::Error;

/// Gateway error types.
///
/// Every gateway call resolves to one of these before the session
/// controller sees it. The distinction between [`GatewayError::Rejected`]
/// and [`GatewayError::Network`] matters on rehydration: an explicit
/// rejection ends the session, an unreachable backend degrades to the
/// cached identity.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The authority refused the login credentials.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The authority explicitly rejected a presented token as invalid or
    /// expired.
    #[error("credentials rejected: {0}")]
    Rejected(String),

    /// The authority could not be reached, or answered outside its
    /// contract (transport failure, unexpected status, unreadable body).
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        GatewayError::Network(e.to_string())
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
