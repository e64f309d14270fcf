//! Cross-tab coordination: revocation broadcast, stale async results,
//! and profile update propagation between two simulated tabs sharing one
//! store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{MockGateway, settle, standard_identity, wait_for_lifecycle};
use repairhub_protocol::{DisconnectReason, Identity, LifecycleState, SessionPolicy, StaffRole};
use repairhub_session::{SessionController, SessionError};
use repairhub_store::{MemoryStore, TokenVault};

fn spawn_tab(store: &MemoryStore, gateway: Arc<MockGateway>) -> Arc<SessionController> {
    SessionController::spawn(
        gateway,
        Arc::new(store.open_tab()),
        SessionPolicy::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_revocation_from_sibling_tab_tears_down_without_polling() {
    common::init_tracing();
    let store = MemoryStore::new();
    let tab_a = spawn_tab(&store, Arc::new(MockGateway::standard_user()));
    let tab_b = spawn_tab(&store, Arc::new(MockGateway::standard_user()));

    tab_a
        .login("jo@shop.test", "hunter2", StaffRole::StandardUser)
        .await
        .unwrap();
    let mut rx_a = tab_a.subscribe();

    // No activity and no timer fires in tab A; the bus delivery alone
    // must collapse it.
    tab_b.revoke_account("user-1").await.unwrap();

    let snapshot = wait_for_lifecycle(&mut rx_a, LifecycleState::Unauthenticated).await;
    let notice = snapshot.notice.expect("teardown notice");
    assert_eq!(notice.reason, DisconnectReason::RevokedByAdministrator);
    assert!(notice.redirect_to_login);
    assert!(snapshot.identity.is_none());

    let vault = TokenVault::new(Arc::new(store.open_tab()));
    assert!(vault.load().await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_revocation_for_other_subject_is_ignored() {
    let store = MemoryStore::new();
    let tab_a = spawn_tab(&store, Arc::new(MockGateway::standard_user()));
    let tab_b = spawn_tab(&store, Arc::new(MockGateway::standard_user()));

    tab_a
        .login("jo@shop.test", "hunter2", StaffRole::StandardUser)
        .await
        .unwrap();

    tab_b.revoke_account("somebody-else").await.unwrap();
    settle().await;

    assert_eq!(tab_a.lifecycle(), LifecycleState::Active);
    assert!(tab_a.snapshot().notice.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_revoking_own_subject_applies_locally() {
    let store = MemoryStore::new();
    let tab = spawn_tab(&store, Arc::new(MockGateway::standard_user()));
    tab.login("jo@shop.test", "hunter2", StaffRole::StandardUser)
        .await
        .unwrap();

    // The bus never delivers a write back to its writer, so the acting
    // tab applies its own signal directly.
    tab.revoke_account("user-1").await.unwrap();

    assert_eq!(tab.lifecycle(), LifecycleState::Unauthenticated);
    let notice = tab.snapshot().notice.expect("teardown notice");
    assert_eq!(notice.reason, DisconnectReason::RevokedByAdministrator);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_result_after_revocation_is_discarded() {
    let store = MemoryStore::new();
    let gateway = Arc::new(MockGateway::standard_user());
    *gateway.refresh_delay.lock().unwrap() = Some(Duration::from_secs(5));
    let tab_a = spawn_tab(&store, Arc::clone(&gateway));
    let tab_b = spawn_tab(&store, Arc::new(MockGateway::standard_user()));

    tab_a
        .login("jo@shop.test", "hunter2", StaffRole::StandardUser)
        .await
        .unwrap();

    let refresh = {
        let tab_a = Arc::clone(&tab_a);
        tokio::spawn(async move { tab_a.refresh().await })
    };
    settle().await;

    let mut rx_a = tab_a.subscribe();
    tab_b.revoke_account("user-1").await.unwrap();
    wait_for_lifecycle(&mut rx_a, LifecycleState::Unauthenticated).await;

    // The in-flight refresh completes afterwards; its result must not
    // resurrect the session.
    let result = refresh.await.unwrap();
    assert!(matches!(result, Err(SessionError::NotAuthenticated)));
    assert_eq!(tab_a.lifecycle(), LifecycleState::Unauthenticated);

    let vault = TokenVault::new(Arc::new(store.open_tab()));
    assert!(vault.load().await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_profile_update_propagates_to_sibling_tab() {
    let store = MemoryStore::new();
    let tab_a = spawn_tab(&store, Arc::new(MockGateway::standard_user()));
    let tab_b = spawn_tab(&store, Arc::new(MockGateway::standard_user()));

    tab_a
        .login("jo@shop.test", "hunter2", StaffRole::StandardUser)
        .await
        .unwrap();
    tab_b
        .login("jo@shop.test", "hunter2", StaffRole::StandardUser)
        .await
        .unwrap();

    let updated = Identity {
        display_name: "Jo Renamed".to_string(),
        ..standard_identity()
    };
    tab_a.apply_profile_update(updated.clone()).await.unwrap();

    let mut rx_b = tab_b.subscribe();
    let snapshot = tokio::time::timeout(
        Duration::from_secs(60),
        rx_b.wait_for(|snapshot| {
            snapshot
                .identity
                .as_ref()
                .is_some_and(|identity| identity.display_name == "Jo Renamed")
        }),
    )
    .await
    .expect("profile update never reached the sibling tab")
    .unwrap()
    .clone();

    assert_eq!(snapshot.identity.as_ref(), Some(&updated));
    // Tab A updated itself synchronously.
    assert_eq!(
        tab_a.snapshot().identity.map(|i| i.display_name),
        Some("Jo Renamed".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn test_profile_update_requires_matching_subject() {
    let store = MemoryStore::new();
    let tab = spawn_tab(&store, Arc::new(MockGateway::standard_user()));
    tab.login("jo@shop.test", "hunter2", StaffRole::StandardUser)
        .await
        .unwrap();

    let other = Identity {
        subject: "somebody-else".to_string(),
        ..standard_identity()
    };
    let result = tab.apply_profile_update(other).await;
    assert!(matches!(result, Err(SessionError::SubjectMismatch)));
}
