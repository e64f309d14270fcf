//! The session controller state machine.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use repairhub_bus::{RevocationBus, RevocationHandler, StorageBus, TopicHandler};
use repairhub_gateway::{CredentialGateway, GatewayError, LoginRequest};
use repairhub_protocol::{
    ActivityKind, DisconnectNotice, Identity, LifecycleState, RevocationSignal, Session,
    SessionPolicy, StaffRole, TrustLevel, has_capability,
};
use repairhub_store::keys::IDENTITY_KEY;
use repairhub_store::{SharedStore, TokenVault};
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use crate::clock::{ClockEvent, SessionClock};
use crate::error::{Result, SessionError};
use crate::snapshot::SessionSnapshot;

/// Everything the controller mutates, behind one lock.
struct ControllerState {
    lifecycle: LifecycleState,
    session: Option<Session>,
    clock: SessionClock,
    notice: Option<DisconnectNotice>,
    countdown_secs: Option<u64>,
    last_activity_at: Option<DateTime<Utc>>,
    refresh_failures: u32,
    /// Bumped on every login and teardown. Async continuations capture the
    /// epoch before their suspension point and discard their result if it
    /// moved, so a response landing after a teardown cannot resurrect the
    /// session.
    epoch: u64,
}

/// Events arriving from the bus dispatchers.
enum BusEvent {
    Revoked(RevocationSignal),
    IdentitySlot(Option<String>),
}

/// Everything the event loop multiplexes over.
enum LoopEvent {
    Clock(ClockEvent),
    Bus(BusEvent),
}

/// The per-tab session state machine.
///
/// `UNAUTHENTICATED -> ACTIVE -> WARNING -> EXPIRED`, with `REVOKED`
/// interrupting `ACTIVE` or `WARNING` unconditionally. `EXPIRED` and
/// `REVOKED` collapse back to `UNAUTHENTICATED` after cleanup. All
/// collaborators are injected: the credential gateway, a tab handle onto
/// the shared store, and the timeout policy.
///
/// Construct with [`SessionController::spawn`]; observe through
/// [`SessionController::subscribe`].
pub struct SessionController {
    gateway: Arc<dyn CredentialGateway>,
    vault: TokenVault,
    revocations: RevocationBus,
    policy: SessionPolicy,
    state: Mutex<ControllerState>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    login_pending: AtomicBool,
    event_loop: StdMutex<Option<JoinHandle<()>>>,
}

impl SessionController {
    /// Create a controller and start its event loop.
    pub fn spawn(
        gateway: Arc<dyn CredentialGateway>,
        store: Arc<dyn SharedStore>,
        policy: SessionPolicy,
    ) -> Arc<Self> {
        let (clock_tx, mut clock_rx) = mpsc::unbounded_channel();
        let (bus_tx, mut bus_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());

        let vault = TokenVault::new(Arc::clone(&store));
        let revocations = RevocationBus::new(Arc::clone(&store));
        let identity_bus = StorageBus::new(store);

        let controller = Arc::new(Self {
            gateway,
            vault,
            revocations,
            policy,
            state: Mutex::new(ControllerState {
                lifecycle: LifecycleState::Unauthenticated,
                session: None,
                clock: SessionClock::new(clock_tx),
                notice: None,
                countdown_secs: None,
                last_activity_at: None,
                refresh_failures: 0,
                epoch: 0,
            }),
            snapshot_tx,
            login_pending: AtomicBool::new(false),
            event_loop: StdMutex::new(None),
        });

        let revocation_sub = controller.revocations.subscribe(Arc::new(RevocationForwarder {
            tx: bus_tx.clone(),
        }));
        let identity_sub = identity_bus.subscribe(
            [IDENTITY_KEY.to_string()],
            Arc::new(IdentitySlotForwarder { tx: bus_tx }),
        );

        let weak = Arc::downgrade(&controller);
        let handle = tokio::spawn(async move {
            // The subscriptions live and die with the loop.
            let _revocation_sub = revocation_sub;
            let _identity_sub = identity_sub;
            loop {
                let event = tokio::select! {
                    clock_event = clock_rx.recv() => clock_event.map(LoopEvent::Clock),
                    bus_event = bus_rx.recv() => bus_event.map(LoopEvent::Bus),
                };
                let Some(event) = event else { break };
                let Some(controller) = weak.upgrade() else { break };
                match event {
                    LoopEvent::Clock(event) => controller.handle_clock_event(event).await,
                    LoopEvent::Bus(event) => controller.handle_bus_event(event).await,
                }
            }
            tracing::debug!("session controller event loop exited");
        });
        if let Ok(mut slot) = controller.event_loop.lock() {
            *slot = Some(handle);
        }

        controller
    }

    // ======================================================================
    // Observation
    // ======================================================================

    /// Subscribe to session snapshots. The receiver always starts with the
    /// current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// The current lifecycle state.
    pub fn lifecycle(&self) -> LifecycleState {
        self.snapshot_tx.borrow().lifecycle
    }

    /// When the last qualifying activity was recorded.
    pub async fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_activity_at
    }

    /// Whether the current session holds a capability. Always false
    /// without a session; super admins bypass the capability set.
    pub async fn has_capability(&self, capability: &str) -> bool {
        let state = self.state.lock().await;
        state
            .session
            .as_ref()
            .is_some_and(|session| has_capability(&session.identity, capability))
    }

    // ======================================================================
    // Login / logout
    // ======================================================================

    /// Exchange credentials for a session and arm the idle timers.
    ///
    /// At most one login may be in flight per tab; a concurrent call fails
    /// fast with [`SessionError::LoginInFlight`].
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        role: StaffRole,
    ) -> Result<Identity> {
        if self.login_pending.swap(true, Ordering::SeqCst) {
            return Err(SessionError::LoginInFlight);
        }
        let _guard = ResetOnDrop(&self.login_pending);
        self.login_inner(email.into(), password.into(), role).await
    }

    async fn login_inner(&self, email: String, password: String, role: StaffRole) -> Result<Identity> {
        {
            let state = self.state.lock().await;
            if state.lifecycle != LifecycleState::Unauthenticated {
                return Err(SessionError::AlreadyAuthenticated);
            }
        }

        let request = LoginRequest::new(email, password, role);
        let success = match self.gateway.login(request).await {
            Ok(success) => success,
            Err(GatewayError::InvalidCredentials(message))
            | Err(GatewayError::Rejected(message)) => {
                tracing::warn!("login refused");
                return Err(SessionError::InvalidCredentials(message));
            }
            Err(GatewayError::Network(message)) => {
                tracing::warn!(error = %message, "login failed, authority unreachable");
                return Err(SessionError::NetworkUnavailable(message));
            }
        };

        let mut state = self.state.lock().await;
        if state.lifecycle != LifecycleState::Unauthenticated {
            // A rehydration slipped in while the exchange was in flight.
            return Err(SessionError::AlreadyAuthenticated);
        }

        self.vault
            .save(
                &success.identity,
                &success.access_token,
                success.refresh_token.as_deref(),
            )
            .await?;

        let identity = success.identity.clone();
        self.install_session(
            &mut state,
            Session::new(success.identity, success.access_token, success.refresh_token),
        );
        tracing::info!(subject = %identity.subject, role = %identity.role, "login succeeded, session active");
        Ok(identity)
    }

    /// User-initiated logout. Clears local state immediately and notifies
    /// the authority on a fire-and-forget task; a failed notification is
    /// ignored by design. Idempotent.
    pub async fn logout(&self) {
        let access_token = {
            let mut state = self.state.lock().await;
            if !state.lifecycle.is_authenticated() {
                return;
            }
            let access_token = state
                .session
                .as_ref()
                .map(|session| session.access_token().to_string());
            tracing::info!("logout requested, tearing down session");
            self.teardown(&mut state, LifecycleState::Unauthenticated, None)
                .await;
            access_token
        };

        if let Some(access_token) = access_token {
            let gateway = Arc::clone(&self.gateway);
            tokio::spawn(async move {
                if let Err(e) = gateway.logout(&access_token).await {
                    tracing::debug!(error = %e, "logout notification failed, ignoring");
                }
            });
        }
    }

    // ======================================================================
    // Activity / extend
    // ======================================================================

    /// Record a user input event. Qualifying events restart both idle
    /// timers from a full window; non-qualifying events are ignored.
    pub async fn record_activity(&self, kind: ActivityKind) {
        if !kind.resets_idle_timer() {
            return;
        }
        let mut state = self.state.lock().await;
        if !state.lifecycle.is_authenticated() {
            return;
        }
        tracing::trace!(kind = ?kind, "activity recorded, restarting idle window");
        self.restart_window(&mut state);
    }

    /// Explicitly extend the session from the warning prompt. Behaves like
    /// a qualifying activity event; calling it twice is the same as once.
    pub async fn extend(&self) {
        let mut state = self.state.lock().await;
        if !state.lifecycle.is_authenticated() {
            return;
        }
        tracing::debug!("session extended from warning prompt");
        self.restart_window(&mut state);
    }

    fn restart_window(&self, state: &mut ControllerState) {
        state.lifecycle = LifecycleState::Active;
        state.countdown_secs = None;
        state.last_activity_at = Some(Utc::now());
        state.clock.arm(&self.policy);
        self.publish_snapshot(state);
    }

    // ======================================================================
    // Rehydration
    // ======================================================================

    /// Rebuild a session from the shared store on tab (re)initialization.
    ///
    /// A stored session is reverified with a profile round trip. An
    /// explicit rejection is treated like a natural expiry: the vault is
    /// cleared and the tab stays unauthenticated. A network-level failure
    /// degrades gracefully - the cached identity is adopted with
    /// [`TrustLevel::CachedUnverified`] rather than forcing a logout.
    pub async fn rehydrate(&self) -> Result<Option<Identity>> {
        {
            let state = self.state.lock().await;
            if state.lifecycle != LifecycleState::Unauthenticated {
                return Ok(state.session.as_ref().map(|s| s.identity.clone()));
            }
        }

        let Some(stored) = self.vault.load().await? else {
            return Ok(None);
        };

        let (identity, trust) = match self.gateway.fetch_profile(&stored.access_token).await {
            Ok(identity) => {
                // Adopt the authoritative identity and write it back so
                // sibling tabs converge on it too.
                self.vault.save_identity(&identity).await?;
                (identity, TrustLevel::Verified)
            }
            Err(GatewayError::Rejected(message))
            | Err(GatewayError::InvalidCredentials(message)) => {
                tracing::info!(error = %message, "stored session rejected by authority, clearing");
                self.vault.clear().await?;
                let mut state = self.state.lock().await;
                state.notice = Some(DisconnectNotice::inactivity());
                self.publish_snapshot(&state);
                return Ok(None);
            }
            Err(GatewayError::Network(message)) => {
                tracing::warn!(error = %message, "authority unreachable, adopting cached identity");
                (stored.identity, TrustLevel::CachedUnverified)
            }
        };

        let mut state = self.state.lock().await;
        if state.lifecycle != LifecycleState::Unauthenticated {
            // A login finished while we were verifying; keep it.
            return Ok(state.session.as_ref().map(|s| s.identity.clone()));
        }
        let session = Session::new(
            identity.clone(),
            stored.access_token,
            stored.refresh_token,
        )
        .with_trust(trust);
        self.install_session(&mut state, session);
        tracing::info!(subject = %identity.subject, trust = ?trust, "session rehydrated");
        Ok(Some(identity))
    }

    // ======================================================================
    // Token refresh
    // ======================================================================

    /// Exchange the stored refresh token for a new access token.
    ///
    /// With no stored refresh token this fails immediately, without a
    /// network call. On success only the access token changes. Repeated
    /// network-level failures escalate to a forced logout once
    /// [`SessionPolicy::max_refresh_failures`] is reached; an explicit
    /// rejection escalates at once.
    pub async fn refresh(&self) -> Result<()> {
        let epoch = {
            let state = self.state.lock().await;
            if !state.lifecycle.is_authenticated() {
                return Err(SessionError::NotAuthenticated);
            }
            state.epoch
        };

        let Some(refresh_token) = self.vault.refresh_token().await? else {
            tracing::warn!("refresh requested with no stored refresh token");
            return Err(SessionError::RefreshTokenMissing);
        };

        match self.gateway.refresh(&refresh_token).await {
            Ok(access_token) => {
                let mut state = self.state.lock().await;
                if state.epoch != epoch || !state.lifecycle.is_authenticated() {
                    tracing::debug!("refresh completed after teardown, discarding result");
                    return Err(SessionError::NotAuthenticated);
                }
                if let Some(session) = state.session.as_mut() {
                    session.set_access_token(access_token.clone());
                }
                self.vault.set_access_token(&access_token).await?;
                state.refresh_failures = 0;
                tracing::debug!("access token refreshed");
                Ok(())
            }
            Err(GatewayError::Rejected(message)) => {
                let mut state = self.state.lock().await;
                if state.epoch == epoch && state.lifecycle.is_authenticated() {
                    tracing::warn!(error = %message, "refresh token rejected, ending session");
                    self.teardown(
                        &mut state,
                        LifecycleState::Expired,
                        Some(DisconnectNotice::inactivity()),
                    )
                    .await;
                }
                Err(SessionError::RefreshRejected(message))
            }
            Err(GatewayError::Network(message))
            | Err(GatewayError::InvalidCredentials(message)) => {
                let mut state = self.state.lock().await;
                if state.epoch == epoch && state.lifecycle.is_authenticated() {
                    state.refresh_failures += 1;
                    tracing::warn!(
                        error = %message,
                        failures = state.refresh_failures,
                        "token refresh failed"
                    );
                    if state.refresh_failures >= self.policy.max_refresh_failures {
                        tracing::warn!("repeated refresh failures, forcing logout");
                        self.teardown(
                            &mut state,
                            LifecycleState::Expired,
                            Some(DisconnectNotice::inactivity()),
                        )
                        .await;
                    }
                }
                Err(SessionError::NetworkUnavailable(message))
            }
        }
    }

    // ======================================================================
    // Administrative actions
    // ======================================================================

    /// Announce that an account's sessions are invalid, tab-wide.
    ///
    /// Sibling tabs receive the signal over the revocation bus; this tab
    /// applies it directly, since the bus never delivers a write back to
    /// its writer.
    pub async fn revoke_account(&self, subject: &str) -> Result<()> {
        let signal = RevocationSignal::now(subject);
        self.revocations.publish(&signal).await?;
        tracing::info!(subject = %subject, "revocation published");

        let mut state = self.state.lock().await;
        if state.lifecycle.is_authenticated()
            && state
                .session
                .as_ref()
                .is_some_and(|session| signal.targets(session.subject()))
        {
            self.apply_revocation(&mut state).await;
        }
        Ok(())
    }

    /// Apply a locally-edited profile and propagate it to sibling tabs
    /// through the identity slot.
    pub async fn apply_profile_update(&self, identity: Identity) -> Result<()> {
        let mut state = self.state.lock().await;
        let Some(session) = state.session.as_mut() else {
            return Err(SessionError::NotAuthenticated);
        };
        if session.subject() != identity.subject {
            return Err(SessionError::SubjectMismatch);
        }
        session.set_identity(identity.clone());
        self.publish_snapshot(&state);
        self.vault.save_identity(&identity).await?;
        tracing::debug!(subject = %identity.subject, "profile update applied and propagated");
        Ok(())
    }

    // ======================================================================
    // Event handling
    // ======================================================================

    async fn handle_clock_event(&self, event: ClockEvent) {
        let mut state = self.state.lock().await;
        match event {
            ClockEvent::WarningDue { generation } => {
                if generation != state.clock.generation()
                    || state.lifecycle != LifecycleState::Active
                {
                    return;
                }
                state.lifecycle = LifecycleState::Warning;
                state.countdown_secs = Some(self.policy.countdown_start_secs());
                state.clock.start_countdown(&self.policy);
                tracing::info!(
                    countdown_secs = self.policy.countdown_start_secs(),
                    "idle warning window entered"
                );
                self.publish_snapshot(&state);
            }
            ClockEvent::CountdownTick {
                generation,
                remaining_secs,
            } => {
                if generation != state.clock.generation()
                    || state.lifecycle != LifecycleState::Warning
                {
                    return;
                }
                if remaining_secs == 0 {
                    self.expire(&mut state).await;
                } else {
                    state.countdown_secs = Some(remaining_secs);
                    self.publish_snapshot(&state);
                }
            }
            ClockEvent::ExpiryDue { generation } => {
                if generation != state.clock.generation() || !state.lifecycle.is_authenticated() {
                    return;
                }
                self.expire(&mut state).await;
            }
        }
    }

    async fn handle_bus_event(&self, event: BusEvent) {
        match event {
            BusEvent::Revoked(signal) => {
                let mut state = self.state.lock().await;
                if !state.lifecycle.is_authenticated() {
                    return;
                }
                let matches = state
                    .session
                    .as_ref()
                    .is_some_and(|session| signal.targets(session.subject()));
                if !matches {
                    tracing::trace!(subject = %signal.target_subject, "revocation for another subject, ignoring");
                    return;
                }
                tracing::warn!(subject = %signal.target_subject, "revocation received from sibling tab");
                self.apply_revocation(&mut state).await;
            }
            BusEvent::IdentitySlot(payload) => self.handle_identity_slot(payload).await,
        }
    }

    async fn handle_identity_slot(&self, payload: Option<String>) {
        let Some(blob) = payload else {
            tracing::debug!("identity slot cleared by sibling tab");
            return;
        };
        let identity: Identity = match serde_json::from_str(&blob) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable identity blob from sibling tab, ignoring");
                return;
            }
        };
        let mut state = self.state.lock().await;
        let Some(session) = state.session.as_mut() else {
            return;
        };
        if session.subject() != identity.subject {
            tracing::debug!(subject = %identity.subject, "identity update for another subject, ignoring");
            return;
        }
        if session.identity == identity {
            return;
        }
        tracing::debug!(subject = %identity.subject, "profile update adopted from sibling tab");
        session.set_identity(identity);
        self.publish_snapshot(&state);
    }

    // ======================================================================
    // Transitions
    // ======================================================================

    fn install_session(&self, state: &mut ControllerState, session: Session) {
        state.session = Some(session);
        state.lifecycle = LifecycleState::Active;
        state.notice = None;
        state.countdown_secs = None;
        state.refresh_failures = 0;
        state.last_activity_at = Some(Utc::now());
        state.epoch += 1;
        state.clock.arm(&self.policy);
        self.publish_snapshot(state);
    }

    async fn expire(&self, state: &mut ControllerState) {
        if !state.lifecycle.is_authenticated() {
            return;
        }
        tracing::info!("session expired from inactivity");
        self.teardown(
            state,
            LifecycleState::Expired,
            Some(DisconnectNotice::inactivity()),
        )
        .await;
    }

    async fn apply_revocation(&self, state: &mut ControllerState) {
        self.teardown(
            state,
            LifecycleState::Revoked,
            Some(DisconnectNotice::revoked()),
        )
        .await;
    }

    /// The single teardown path. `via` is the transient state observers
    /// see before the collapse to `Unauthenticated`. Idempotent.
    async fn teardown(
        &self,
        state: &mut ControllerState,
        via: LifecycleState,
        notice: Option<DisconnectNotice>,
    ) {
        state.clock.disarm();
        state.countdown_secs = None;
        state.refresh_failures = 0;
        state.epoch += 1;
        state.notice = notice;
        if via != LifecycleState::Unauthenticated {
            // The transient state still shows who the session belonged to.
            state.lifecycle = via;
            self.publish_snapshot(state);
        }
        state.session = None;
        state.last_activity_at = None;
        if let Err(e) = self.vault.clear().await {
            // The local session still ends; the stale slots will be
            // overwritten by the next login.
            tracing::error!(error = %e, "failed to clear token vault during teardown");
        }
        state.lifecycle = LifecycleState::Unauthenticated;
        self.publish_snapshot(state);
    }

    fn publish_snapshot(&self, state: &ControllerState) {
        let snapshot = SessionSnapshot {
            lifecycle: state.lifecycle,
            identity: state.session.as_ref().map(|s| s.identity.clone()),
            trust: state.session.as_ref().map(|s| s.trust),
            countdown_seconds: state.countdown_secs,
            notice: state.notice,
        };
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.event_loop.lock()
            && let Some(handle) = slot.take()
        {
            handle.abort();
        }
    }
}

/// Clears the login-pending flag however `login` returns.
struct ResetOnDrop<'a>(&'a AtomicBool);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct RevocationForwarder {
    tx: mpsc::UnboundedSender<BusEvent>,
}

#[async_trait]
impl RevocationHandler for RevocationForwarder {
    async fn on_revocation(&self, signal: RevocationSignal) {
        let _ = self.tx.send(BusEvent::Revoked(signal));
    }
}

struct IdentitySlotForwarder {
    tx: mpsc::UnboundedSender<BusEvent>,
}

#[async_trait]
impl TopicHandler for IdentitySlotForwarder {
    async fn on_message(&self, _topic: &str, payload: Option<&str>) {
        let _ = self.tx.send(BusEvent::IdentitySlot(payload.map(str::to_string)));
    }
}
