//! HTTP implementation of the credential gateway.

use async_trait::async_trait;
use repairhub_protocol::Identity;
use reqwest::{Response, StatusCode};
use secrecy::ExposeSecret;

use crate::client::create_default_client;
use crate::error::{GatewayError, Result};
use crate::gateway::{CredentialGateway, LoginRequest, LoginSuccess};
use crate::wire::{ErrorReply, LoginBody, LoginReply, RefreshBody, RefreshReply, WireUser};

/// Credential gateway over HTTP.
#[derive(Clone)]
pub struct HttpCredentialGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCredentialGateway {
    /// Create a gateway for the given authority base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)
            .map_err(|e| GatewayError::Network(format!("invalid base URL '{base_url}': {e}")))?;
        let client = create_default_client().map_err(GatewayError::Network)?;
        Ok(Self { client, base_url })
    }

    /// Create a gateway with a caller-provided client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Pull the authority's `{message}` out of an error reply, if it sent one.
async fn error_message(response: Response, fallback: &str) -> String {
    response
        .json::<ErrorReply>()
        .await
        .ok()
        .and_then(|reply| reply.message)
        .unwrap_or_else(|| fallback.to_string())
}

fn is_rejection(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
    )
}

#[async_trait]
impl CredentialGateway for HttpCredentialGateway {
    async fn login(&self, request: LoginRequest) -> Result<LoginSuccess> {
        let body = LoginBody {
            email: &request.email,
            password: request.password.expose_secret(),
        };
        let response = self
            .client
            .post(self.url(request.portal.path()))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "login refused by credential authority");
            let message = error_message(response, "invalid email or password").await;
            return Err(GatewayError::InvalidCredentials(message));
        }

        let reply: LoginReply = response.json().await?;
        Ok(LoginSuccess {
            identity: reply.user.into_identity(),
            access_token: reply.token,
            refresh_token: reply.refresh_token,
        })
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Identity> {
        let response = self
            .client
            .get(self.url("/api/users/profile"))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if is_rejection(status) {
            let message = error_message(response, "token invalid or expired").await;
            return Err(GatewayError::Rejected(message));
        }
        if !status.is_success() {
            return Err(GatewayError::Network(format!(
                "profile request failed: {status}"
            )));
        }

        let user: WireUser = response.json().await?;
        Ok(user.into_identity())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url("/api/users/refresh-token"))
            .json(&RefreshBody { refresh_token })
            .send()
            .await?;

        let status = response.status();
        if is_rejection(status) {
            let message = error_message(response, "refresh token invalid or expired").await;
            return Err(GatewayError::Rejected(message));
        }
        if !status.is_success() {
            return Err(GatewayError::Network(format!(
                "refresh request failed: {status}"
            )));
        }

        let reply: RefreshReply = response.json().await?;
        Ok(reply.token)
    }

    async fn logout(&self, access_token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/users/logout"))
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Network(format!(
                "logout request failed: {status}"
            )));
        }
        Ok(())
    }
}
