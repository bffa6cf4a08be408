//! Session lifecycle against the mock backend over real HTTP.
//!
//! Each test starts its own backend on an ephemeral port and keeps the
//! session file in a temporary directory.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pharmacy_client::auth::{AuthContext, AuthError, LoginFailure, SessionState};
use pharmacy_client::storage::{FileStore, StorageKey, TokenStore};
use pharmacy_client::HttpApi;
use pharmacy_core::{GuardDecision, Role};
use pharmacy_integration_tests::{AccountStatus, MockAccount, MockBackend};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use url::Url;

const PASSWORD: &str = "correct-horse";

fn manager() -> MockAccount {
    MockAccount::new(7, "manager@pharmacy.et", PASSWORD, Role::Manager.id())
}

fn context(api_url: Url, session_file: &Path) -> AuthContext {
    let api = HttpApi::new(api_url, Duration::from_secs(5)).unwrap();
    AuthContext::new(Arc::new(api), Arc::new(FileStore::new(session_file)))
}

async fn login(auth: &AuthContext, email: &str, password: &str) -> Result<(), AuthError> {
    auth.login(
        email,
        &SecretString::from(password.to_owned()),
        &CancellationToken::new(),
    )
    .await
    .map(|_| ())
}

#[tokio::test]
async fn test_login_persists_and_restores_session() {
    let backend = MockBackend::start(vec![manager()]).await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let auth = context(backend.api_url(), &file);
    let outcome = auth
        .login(
            "manager@pharmacy.et",
            &SecretString::from(PASSWORD.to_owned()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(outcome.user.role, Some(Role::Manager));
    assert_eq!(outcome.destination(), "/manager/dashboard");
    assert!(auth.state().is_authenticated());

    let store = FileStore::new(&file);
    assert!(store.get(StorageKey::AccessToken).is_some());
    assert_eq!(store.get(StorageKey::RefreshToken).as_deref(), Some("refresh-7"));
    assert_eq!(store.get(StorageKey::UserRole).as_deref(), Some("manager"));
    assert_eq!(store.get(StorageKey::BranchId).as_deref(), Some("1"));

    // A fresh context picks the session up from disk.
    let restored = context(backend.api_url(), &file);
    restored.initialize(&CancellationToken::new()).await.unwrap();
    let state = restored.state();
    assert_eq!(state.user_email(), Some("manager@pharmacy.et"));
    assert_eq!(state.role_id(), Some(Role::Manager.id()));
    assert_eq!(backend.state().profile_calls, 1);

    backend.stop().await;
}

#[tokio::test]
async fn test_wrong_password_keeps_user_signed_out() {
    let backend = MockBackend::start(vec![manager()]).await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    let auth = context(backend.api_url(), &file);

    let err = login(&auth, "manager@pharmacy.et", "wrong").await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::LoginFailed { reason: LoginFailure::Other(ref message), .. }
            if message == "Invalid email or password"
    ));
    assert!(!auth.state().is_authenticated());
    assert!(FileStore::new(&file).get(StorageKey::AccessToken).is_none());

    backend.stop().await;
}

#[tokio::test]
async fn test_login_failures_are_classified() {
    let pending = MockAccount::new(8, "pending@pharmacy.et", PASSWORD, Role::Manager.id())
        .with_status(AccountStatus::PendingActivation);
    let backend = MockBackend::start(vec![manager(), pending]).await;
    let dir = tempfile::tempdir().unwrap();
    let auth = context(backend.api_url(), &dir.path().join("session.json"));

    let err = login(&auth, "pending@pharmacy.et", PASSWORD).await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::LoginFailed { reason: LoginFailure::PendingActivation, .. }
    ));

    backend.state().throttle_after = Some(1);
    let err = login(&auth, "manager@pharmacy.et", PASSWORD).await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::LoginFailed { reason: LoginFailure::TooManyAttempts, .. }
    ));

    backend.stop().await;
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_failure() {
    // Bind then drop to get a port nothing is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let api_url = Url::parse(&format!("http://{addr}/api")).unwrap();
    let auth = context(api_url, &dir.path().join("session.json"));

    let err = login(&auth, "manager@pharmacy.et", PASSWORD).await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::LoginFailed { reason: LoginFailure::Network, .. }
    ));
}

#[tokio::test]
async fn test_password_change_redirect() {
    let account = manager().with_status(AccountStatus::MustChangePassword);
    let backend = MockBackend::start(vec![account]).await;
    let dir = tempfile::tempdir().unwrap();
    let auth = context(backend.api_url(), &dir.path().join("session.json"));

    let outcome = auth
        .login(
            "manager@pharmacy.et",
            &SecretString::from(PASSWORD.to_owned()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(outcome.password_change_required);
    assert_eq!(outcome.destination(), "/change-password");

    backend.stop().await;
}

#[tokio::test]
async fn test_logout_clears_backend_and_disk() {
    let backend = MockBackend::start(vec![manager()]).await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    let auth = context(backend.api_url(), &file);
    login(&auth, "manager@pharmacy.et", PASSWORD).await.unwrap();

    auth.logout().await;
    assert_eq!(auth.state(), SessionState::Anonymous);
    assert_eq!(backend.state().logged_out.len(), 1);

    let store = FileStore::new(&file);
    for key in StorageKey::ALL {
        assert!(store.get(key).is_none(), "{key} survived logout");
    }

    // Nothing left to restore, so the backend is not asked.
    let restored = context(backend.api_url(), &file);
    restored.initialize(&CancellationToken::new()).await.unwrap();
    assert_eq!(restored.state(), SessionState::Anonymous);
    assert_eq!(backend.state().profile_calls, 0);

    backend.stop().await;
}

#[tokio::test]
async fn test_revoked_token_is_cleared_on_restore() {
    let backend = MockBackend::start(vec![manager()]).await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    login(&context(backend.api_url(), &file), "manager@pharmacy.et", PASSWORD)
        .await
        .unwrap();

    backend.state().issued.clear();

    let restored = context(backend.api_url(), &file);
    restored.initialize(&CancellationToken::new()).await.unwrap();
    assert_eq!(restored.state(), SessionState::Anonymous);
    assert!(FileStore::new(&file).get(StorageKey::AccessToken).is_none());

    backend.stop().await;
}

#[tokio::test]
async fn test_route_guard_follows_the_session() {
    let backend = MockBackend::start(vec![manager()]).await;
    let dir = tempfile::tempdir().unwrap();
    let auth = context(backend.api_url(), &dir.path().join("session.json"));
    auth.initialize(&CancellationToken::new()).await.unwrap();

    let (_, decision) = auth.resolve("/manager/staff");
    assert_eq!(
        decision,
        GuardDecision::RedirectToLogin {
            from: "/manager/staff".to_string()
        }
    );

    login(&auth, "manager@pharmacy.et", PASSWORD).await.unwrap();
    assert_eq!(auth.resolve("/manager/staff").1, GuardDecision::Render);
    assert_eq!(
        auth.resolve("/admin/dashboard").1,
        GuardDecision::Redirect {
            to: "/manager/dashboard"
        }
    );
    assert!(auth.has_permission("users.create"));
    assert!(!auth.has_permission("inventory.write"));

    backend.stop().await;
}

#[tokio::test]
async fn test_cancelled_restore_leaves_session_on_disk() {
    let backend = MockBackend::start(vec![manager()]).await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    login(&context(backend.api_url(), &file), "manager@pharmacy.et", PASSWORD)
        .await
        .unwrap();
    backend.state().profile_delay = Some(Duration::from_secs(30));

    let restored = context(backend.api_url(), &file);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = restored.initialize(&cancel).await.unwrap_err();
    assert!(matches!(err, AuthError::Cancelled));
    assert_eq!(restored.state(), SessionState::Uninitialized);
    assert!(FileStore::new(&file).get(StorageKey::AccessToken).is_some());
}
