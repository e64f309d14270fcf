//! Wire types for the credential authority's JSON bodies.

use repairhub_protocol::{Identity, StaffRole};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/users/login` and `POST /api/users/admin/login`.
#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login reply: `{user, token, refreshToken}`.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginReply {
    pub user: WireUser,
    pub token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Error reply carried on non-2xx statuses: `{message}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorReply {
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /api/users/refresh-token`.
#[derive(Debug, Serialize)]
pub(crate) struct RefreshBody<'a> {
    #[serde(rename = "refreshToken")]
    pub refresh_token: &'a str,
}

/// Reply of `POST /api/users/refresh-token`: `{token}`.
#[derive(Debug, Deserialize)]
pub(crate) struct RefreshReply {
    pub token: String,
}

/// The authority's user record, also the reply of `GET /api/users/profile`.
#[derive(Debug, Deserialize)]
pub(crate) struct WireUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: StaffRole,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl WireUser {
    pub(crate) fn into_identity(self) -> Identity {
        Identity::new(self.id, self.name, self.email, self.role, self.permissions)
    }
}
