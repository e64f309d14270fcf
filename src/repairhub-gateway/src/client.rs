//! HTTP client factory for gateway calls.

use std::time::Duration;

use reqwest::Client;

/// User-Agent string for all gateway requests
pub const USER_AGENT: &str = concat!("repairhub-dashboard/", env!("CARGO_PKG_VERSION"));

/// Default timeout for gateway requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates an HTTP client with the standard gateway configuration.
///
/// Includes: User-Agent, tcp_nodelay, 30s timeout, and a read timeout to
/// prevent hangs on truncated responses.
pub fn create_default_client() -> Result<Client, String> {
    create_client_with_timeout(DEFAULT_TIMEOUT)
}

/// Creates an HTTP client with a custom timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Result<Client, String> {
    let read_timeout = timeout.min(Duration::from_secs(60));

    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .read_timeout(read_timeout)
        .tcp_nodelay(true)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {e}"))
}
