//! The credential gateway seam.

use async_trait::async_trait;
use repairhub_protocol::{Identity, StaffRole};
use secrecy::SecretString;

use crate::error::Result;

/// Which login endpoint a credential exchange goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPortal {
    /// Regular staff portal.
    Staff,
    /// Administrative portal, used for admin and super-admin logins.
    Admin,
}

impl LoginPortal {
    /// Portal for the role the user is signing in as.
    pub fn for_role(role: StaffRole) -> Self {
        if role.uses_admin_portal() {
            LoginPortal::Admin
        } else {
            LoginPortal::Staff
        }
    }

    /// Endpoint path for this portal.
    pub fn path(&self) -> &'static str {
        match self {
            LoginPortal::Staff => "/api/users/login",
            LoginPortal::Admin => "/api/users/admin/login",
        }
    }
}

/// A credential exchange request.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// Login email.
    pub email: String,
    /// Password, kept out of logs.
    pub password: SecretString,
    /// Portal to exchange through.
    pub portal: LoginPortal,
}

impl LoginRequest {
    /// Build a request for the given role's portal.
    pub fn new(email: impl Into<String>, password: impl Into<String>, role: StaffRole) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
            portal: LoginPortal::for_role(role),
        }
    }
}

/// A successful credential exchange.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    /// The authenticated identity.
    pub identity: Identity,
    /// Short-lived bearer access token.
    pub access_token: String,
    /// Long-lived refresh token, when the authority issues one.
    pub refresh_token: Option<String>,
}

/// Client for the remote credential authority.
///
/// Implementations resolve every outcome to a typed
/// [`GatewayError`](crate::GatewayError) kind; callers never handle raw
/// transport errors.
#[async_trait]
pub trait CredentialGateway: Send + Sync {
    /// Exchange credentials for an identity and token pair.
    async fn login(&self, request: LoginRequest) -> Result<LoginSuccess>;

    /// Fetch the identity the access token currently belongs to. Used to
    /// reverify a rehydrated session.
    async fn fetch_profile(&self, access_token: &str) -> Result<Identity>;

    /// Exchange a refresh token for a new access token.
    async fn refresh(&self, refresh_token: &str) -> Result<String>;

    /// Tell the authority the session is over. Callers treat this as
    /// best-effort and ignore failures.
    async fn logout(&self, access_token: &str) -> Result<()>;
}
