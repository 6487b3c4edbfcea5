//! Integration tests for sign-in, token refresh and request replay.

use std::sync::Arc;

use axum::http::Method;
use emporium_admin::api::LoginRequest;
use emporium_admin::{ApiError, AuthState, KeyValueStore, MemoryStore, TokenStore};
use emporium_integration_tests::{MockBackend, PASSWORD};
use secrecy::{ExposeSecret, SecretString};

fn login_request(password: &str) -> LoginRequest {
    LoginRequest {
        username: "admin".to_owned(),
        password: SecretString::from(password.to_owned()),
    }
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_login_stores_session() {
    let backend = MockBackend::start().await.expect("mock starts");
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let client = backend.client(Arc::clone(&store));
    assert_eq!(client.current_auth_state(), AuthState::LoggedOut);

    let user = client.login(&login_request(PASSWORD)).await.expect("login succeeds");
    assert_eq!(user.username, "admin");
    assert_eq!(client.current_auth_state(), AuthState::Authenticated);

    let tokens = TokenStore::new(store);
    let access = tokens.access_token().expect("readable").expect("stored");
    assert_eq!(access.expose_secret(), "access-0");
    assert_eq!(
        tokens.current_user().expect("readable").map(|u| u.username),
        Some("admin".to_owned())
    );

    // The stored token is used from now on
    let users = client.admin_users().await.expect("authorized");
    assert_eq!(users.len(), 3);
}

#[tokio::test]
async fn test_login_bad_credentials_keeps_backend_message() {
    let backend = MockBackend::start().await.expect("mock starts");
    let client = backend.client(Arc::new(MemoryStore::new()));

    let err = client.login(&login_request("wrong")).await.expect_err("rejected");
    match err {
        ApiError::Api { status, message, .. } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backend.state().count(&Method::POST, "auth/refresh/"), 0);
    assert_eq!(client.current_auth_state(), AuthState::LoggedOut);
}

#[tokio::test]
async fn test_logout_forgets_session() {
    let backend = MockBackend::start().await.expect("mock starts");
    let store = backend.signed_in_store();
    let client = backend.client(Arc::clone(&store));

    client.logout().expect("logout");

    assert!(client.current_user().expect("readable").is_none());
    assert!(TokenStore::new(store).access_token().expect("readable").is_none());
    assert_eq!(client.current_auth_state(), AuthState::LoggedOut);
}

// ============================================================================
// Refresh and replay
// ============================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_replayed() {
    let backend = MockBackend::start().await.expect("mock starts");
    let store = backend.signed_in_store();
    let client = backend.client(Arc::clone(&store));
    backend.rotate_access_token();

    let users = client.admin_users().await.expect("replayed after refresh");
    assert_eq!(users.len(), 3);

    {
        let state = backend.state();
        assert_eq!(state.count(&Method::GET, "admin/users/"), 2);
        assert_eq!(state.count(&Method::POST, "auth/refresh/"), 1);
    }

    let access = TokenStore::new(store)
        .access_token()
        .expect("readable")
        .expect("stored");
    assert_eq!(access.expose_secret(), "access-1");
    assert_eq!(client.current_auth_state(), AuthState::Authenticated);
}

#[tokio::test]
async fn test_refresh_failure_clears_tokens_and_requires_login() {
    let backend = MockBackend::start().await.expect("mock starts");
    let store = backend.signed_in_store();
    let client = backend.client(Arc::clone(&store));
    let mut auth = client.auth_state();
    {
        let mut state = backend.state();
        state.refresh_succeeds = false;
    }
    backend.rotate_access_token();

    let err = client.admin_users().await.expect_err("session expired");
    assert!(matches!(err, ApiError::SessionExpired));
    assert!(err.requires_login());

    let tokens = TokenStore::new(store);
    assert!(tokens.access_token().expect("readable").is_none());
    assert!(tokens.refresh_token().expect("readable").is_none());

    assert!(auth.has_changed().expect("sender alive"));
    assert_eq!(*auth.borrow_and_update(), AuthState::LoginRequired);

    // Exactly one attempt, no replay
    let state = backend.state();
    assert_eq!(state.count(&Method::GET, "admin/users/"), 1);
    assert_eq!(state.count(&Method::POST, "auth/refresh/"), 1);
}

#[tokio::test]
async fn test_unauthorized_without_refresh_token() {
    let backend = MockBackend::start().await.expect("mock starts");
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    TokenStore::new(Arc::clone(&store))
        .set_access(&SecretString::from("stale".to_owned()))
        .expect("stored");
    let client = backend.client(store);

    let err = client.admin_users().await.expect_err("unauthorized");
    assert!(matches!(err, ApiError::Unauthorized));
    assert_eq!(backend.state().count(&Method::POST, "auth/refresh/"), 0);
}

#[tokio::test]
async fn test_concurrent_401s_refresh_once() {
    let backend = MockBackend::start().await.expect("mock starts");
    let client = backend.client(backend.signed_in_store());
    backend.rotate_access_token();

    let (users, orders, products) = tokio::join!(client.admin_users(), client.admin_orders(), client.admin_products());
    assert_eq!(users.expect("users").len(), 3);
    assert_eq!(orders.expect("orders").len(), 3);
    assert_eq!(products.expect("products").len(), 4);

    assert_eq!(backend.state().count(&Method::POST, "auth/refresh/"), 1);
}
