//! Credential gateway client for the RepairHub session core.
//!
//! Exchanges credentials for sessions against the remote authority and
//! maps every transport or HTTP outcome onto the typed error kinds the
//! session controller understands - the controller never sees a raw
//! transport error. The [`CredentialGateway`] trait is the seam tests
//! replace with doubles; [`HttpCredentialGateway`] is the production
//! implementation over reqwest.

pub mod client;
pub mod error;
pub mod gateway;
pub mod http;
mod wire;

// Re-export main types at crate root
pub use client::{DEFAULT_TIMEOUT, USER_AGENT, create_default_client};
pub use error::{GatewayError, Result};
pub use gateway::{CredentialGateway, LoginPortal, LoginRequest, LoginSuccess};
pub use http::HttpCredentialGateway;
