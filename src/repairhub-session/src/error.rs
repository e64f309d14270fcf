//! Error types for repairhub-session.

use thiserror::Error;

/// Session error types.
///
/// Gateway outcomes are already resolved to typed kinds before they get
/// here; nothing below wraps a raw transport error. Forced teardowns
/// (inactivity expiry, administrative revocation) are not errors - they
/// surface as [`DisconnectNotice`](repairhub_protocol::DisconnectNotice)
/// values in the session snapshot.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The credential authority refused the login.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The credential authority could not be reached.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// A login is already in flight for this tab.
    #[error("another login is already in progress")]
    LoginInFlight,

    /// Login attempted while a session is already held.
    #[error("a session is already active")]
    AlreadyAuthenticated,

    /// The operation needs an active session and there is none.
    #[error("no active session")]
    NotAuthenticated,

    /// Refresh attempted with no stored refresh token. The session is
    /// unrecoverable; callers must not auto-retry.
    #[error("no refresh token is stored")]
    RefreshTokenMissing,

    /// The authority explicitly rejected the refresh token. The session
    /// has been torn down.
    #[error("refresh token rejected: {0}")]
    RefreshRejected(String),

    /// A profile update named a subject other than the session's.
    #[error("profile update targets a different subject")]
    SubjectMismatch,

    /// The shared store rejected an operation.
    #[error("store error: {0}")]
    Store(#[from] repairhub_store::StoreError),

    /// The revocation bus rejected a publish.
    #[error("bus error: {0}")]
    Bus(#[from] repairhub_bus::BusError),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
