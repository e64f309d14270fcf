//! Shared test doubles and helpers for controller integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use repairhub_gateway::{CredentialGateway, GatewayError, LoginRequest, LoginSuccess};
use repairhub_protocol::{Identity, LifecycleState, StaffRole};
use repairhub_session::SessionSnapshot;
use tokio::sync::watch;

/// Scripted outcome for one mock endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Reject,
    NetworkFail,
}

/// Credential gateway double with scripted behaviors and call counters.
pub struct MockGateway {
    pub identity: Identity,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub refreshed_access_token: String,
    pub login_behavior: Mutex<Behavior>,
    pub profile_behavior: Mutex<Behavior>,
    pub refresh_behavior: Mutex<Behavior>,
    pub logout_behavior: Mutex<Behavior>,
    pub login_delay: Mutex<Option<Duration>>,
    pub refresh_delay: Mutex<Option<Duration>>,
    pub login_calls: AtomicUsize,
    pub profile_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
}

impl MockGateway {
    pub fn for_identity(identity: Identity) -> Self {
        Self {
            identity,
            access_token: "access-1".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            refreshed_access_token: "access-2".to_string(),
            login_behavior: Mutex::new(Behavior::Succeed),
            profile_behavior: Mutex::new(Behavior::Succeed),
            refresh_behavior: Mutex::new(Behavior::Succeed),
            logout_behavior: Mutex::new(Behavior::Succeed),
            login_delay: Mutex::new(None),
            refresh_delay: Mutex::new(None),
            login_calls: AtomicUsize::new(0),
            profile_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
        }
    }

    pub fn standard_user() -> Self {
        Self::for_identity(standard_identity())
    }

    fn behavior(slot: &Mutex<Behavior>) -> Behavior {
        *slot.lock().unwrap()
    }
}

#[async_trait]
impl CredentialGateway for MockGateway {
    async fn login(&self, _request: LoginRequest) -> Result<LoginSuccess, GatewayError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.login_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match Self::behavior(&self.login_behavior) {
            Behavior::Succeed => Ok(LoginSuccess {
                identity: self.identity.clone(),
                access_token: self.access_token.clone(),
                refresh_token: self.refresh_token.clone(),
            }),
            Behavior::Reject => Err(GatewayError::InvalidCredentials(
                "Invalid email or password".to_string(),
            )),
            Behavior::NetworkFail => Err(GatewayError::Network("connection refused".to_string())),
        }
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<Identity, GatewayError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        match Self::behavior(&self.profile_behavior) {
            Behavior::Succeed => Ok(self.identity.clone()),
            Behavior::Reject => Err(GatewayError::Rejected(
                "token invalid or expired".to_string(),
            )),
            Behavior::NetworkFail => Err(GatewayError::Network("connection refused".to_string())),
        }
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<String, GatewayError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.refresh_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match Self::behavior(&self.refresh_behavior) {
            Behavior::Succeed => Ok(self.refreshed_access_token.clone()),
            Behavior::Reject => Err(GatewayError::Rejected(
                "refresh token invalid or expired".to_string(),
            )),
            Behavior::NetworkFail => Err(GatewayError::Network("connection refused".to_string())),
        }
    }

    async fn logout(&self, _access_token: &str) -> Result<(), GatewayError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match Self::behavior(&self.logout_behavior) {
            Behavior::Succeed => Ok(()),
            Behavior::Reject | Behavior::NetworkFail => {
                Err(GatewayError::Network("connection refused".to_string()))
            }
        }
    }
}

/// A standard user with one capability, per the fixtures the dashboard
/// seeds in development.
pub fn standard_identity() -> Identity {
    Identity::new(
        "user-1",
        "Jo Doe",
        "jo@shop.test",
        StaffRole::StandardUser,
        ["manage_repairs".to_string()],
    )
}

pub fn super_admin_identity() -> Identity {
    Identity::new(
        "admin-1",
        "Sam Root",
        "sam@shop.test",
        StaffRole::SuperAdmin,
        Vec::new(),
    )
}

/// Let every spawned task run without advancing the (possibly paused)
/// clock.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Wait until the controller reports the wanted lifecycle state.
pub async fn wait_for_lifecycle(
    rx: &mut watch::Receiver<SessionSnapshot>,
    want: LifecycleState,
) -> SessionSnapshot {
    let snapshot = tokio::time::timeout(
        Duration::from_secs(7200),
        rx.wait_for(|snapshot| snapshot.lifecycle == want),
    )
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {want}"))
    .expect("controller dropped while waiting");
    snapshot.clone()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
