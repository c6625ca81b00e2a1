//! Session resolution and auth context tests
//!
//! Run with: cargo test --test session_tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use parkgate::api::ApiResponse;
use parkgate::auth::{
    AuthApi, AuthContext, AuthToken, LoginRequest, Resolution, Role, SessionResolver,
    SessionState, User,
};
use parkgate::error::{Error, ErrorKind, Result};
use parkgate::storage::{KeyValueStore, MemoryStore, TokenStore, UserCache};

/// Scripted backend that counts calls
#[derive(Default)]
struct FakeAuthApi {
    current_user: Mutex<Option<Value>>,
    logout_fails: bool,
    delay: Option<Duration>,
    logout_delay: Option<Duration>,
    verify_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    logins: Mutex<Vec<LoginRequest>>,
}

impl FakeAuthApi {
    fn answering(body: Value) -> Self {
        Self {
            current_user: Mutex::new(Some(body)),
            ..Self::default()
        }
    }

    fn unreachable() -> Self {
        Self::default()
    }

    fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn current_user(&self, token: &AuthToken) -> Result<ApiResponse<User>> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        // Tokens issued by login are always accepted
        if token.expose() == "fresh-token" {
            return Ok(serde_json::from_value(json!({
                "success": true,
                "data": { "id": "u1", "role": "PARTNER" }
            }))?);
        }
        let body = self.current_user.lock().unwrap().clone();
        match body {
            Some(body) => Ok(serde_json::from_value(body)?),
            None => Err(Error::Network("connection refused".to_string())),
        }
    }

    async fn logout(&self, _token: &AuthToken) -> Result<ApiResponse<Value>> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.logout_delay {
            tokio::time::sleep(delay).await;
        }
        if self.logout_fails {
            Err(Error::Network("connection reset".to_string()))
        } else {
            Ok(serde_json::from_value(json!({ "success": true }))?)
        }
    }

    async fn login_init(&self, _request: &LoginRequest) -> Result<ApiResponse<Value>> {
        Ok(serde_json::from_value(
            json!({ "success": true, "message": "OTP sent to your phone" }),
        )?)
    }

    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<User>> {
        self.logins.lock().unwrap().push(request.clone());
        if request.otp.as_deref() == Some("123456") {
            Ok(serde_json::from_value(json!({
                "success": true,
                "token": "fresh-token",
                "data": { "id": "u1", "role": "PARTNER" }
            }))?)
        } else {
            Ok(serde_json::from_value(
                json!({ "success": false, "message": "Invalid OTP" }),
            )?)
        }
    }
}

struct Harness {
    store: MemoryStore,
    api: Arc<FakeAuthApi>,
    resolver: SessionResolver,
}

impl Harness {
    fn new(api: FakeAuthApi) -> Self {
        let store = MemoryStore::new();
        let api = Arc::new(api);
        let shared: Arc<dyn KeyValueStore> = Arc::new(store.clone());
        let resolver = SessionResolver::new(
            TokenStore::new(Arc::clone(&shared), "auth_token"),
            UserCache::new(shared, "auth_user"),
            api.clone(),
        );
        Self {
            store,
            api,
            resolver,
        }
    }

    async fn with_token(self) -> Self {
        self.resolver
            .tokens()
            .save_token(&AuthToken::new("stored-token").unwrap())
            .await
            .unwrap();
        self
    }

    async fn with_cached_user(self, user: &User) -> Self {
        self.resolver.users().save_user(user).await.unwrap();
        self
    }

    async fn token(&self) -> Option<AuthToken> {
        self.resolver.tokens().get_token().await.unwrap()
    }

    async fn cached_user(&self) -> Option<User> {
        self.resolver.users().get_user().await.unwrap()
    }
}

/// Store whose every operation fails
struct BrokenStore;

#[async_trait]
impl KeyValueStore for BrokenStore {
    async fn get_item(&self, _key: &str) -> Result<Option<String>> {
        Err(Error::Storage("disk unavailable".to_string()))
    }

    async fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
        Err(Error::Storage("disk unavailable".to_string()))
    }

    async fn remove_item(&self, _key: &str) -> Result<()> {
        Err(Error::Storage("disk unavailable".to_string()))
    }
}

// ============================================================================
// Resolution scenarios
// ============================================================================

#[tokio::test]
async fn test_cached_user_skips_network() {
    let partner = User::new("u1", Role::Partner);
    let h = Harness::new(FakeAuthApi::unreachable())
        .with_token()
        .await
        .with_cached_user(&partner)
        .await;

    let resolution = h.resolver.resolve_detailed().await;
    assert_eq!(resolution, Resolution::Cached(partner));
    assert_eq!(h.api.verify_calls(), 0);
    println!("✓ Cached user adopted without a remote call");
}

#[tokio::test]
async fn test_valid_token_is_verified_and_cached() {
    let h = Harness::new(FakeAuthApi::answering(json!({
        "success": true,
        "data": { "id": "u1", "role": "PARTNER" }
    })))
    .with_token()
    .await;

    let user = h.resolver.resolve().await.expect("user resolved");
    assert_eq!(user.id, "u1");
    assert_eq!(user.role, Role::Partner);
    assert_eq!(h.api.verify_calls(), 1);
    assert_eq!(h.cached_user().await, Some(user));
    assert!(h.token().await.is_some());
}

#[tokio::test]
async fn test_rejected_token_is_removed() {
    let h = Harness::new(FakeAuthApi::answering(json!({ "success": false })))
        .with_token()
        .await;

    assert!(h.resolver.resolve().await.is_none());
    assert!(h.token().await.is_none());
    assert!(h.cached_user().await.is_none());
}

#[tokio::test]
async fn test_unreachable_backend_resolves_anonymous() {
    let h = Harness::new(FakeAuthApi::unreachable()).with_token().await;

    assert_eq!(h.resolver.resolve_detailed().await, Resolution::Anonymous);
    assert!(h.token().await.is_none());
}

#[tokio::test]
async fn test_removed_token_means_no_user() {
    let partner = User::new("u1", Role::Partner);
    let h = Harness::new(FakeAuthApi::unreachable())
        .with_token()
        .await
        .with_cached_user(&partner)
        .await;
    assert!(h.resolver.resolve().await.is_some());

    h.resolver.tokens().remove_token().await.unwrap();
    assert!(h.resolver.resolve().await.is_none());
    assert!(h.cached_user().await.is_none(), "stale profile purged");
    assert_eq!(h.api.verify_calls(), 0);
}

#[tokio::test]
async fn test_no_token_no_cache_is_anonymous() {
    let h = Harness::new(FakeAuthApi::unreachable());
    assert_eq!(h.resolver.resolve_detailed().await, Resolution::Anonymous);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_broken_storage_fails_soft() {
    let store: Arc<dyn KeyValueStore> = Arc::new(BrokenStore);
    let resolver = SessionResolver::new(
        TokenStore::new(Arc::clone(&store), "auth_token"),
        UserCache::new(store, "auth_user"),
        Arc::new(FakeAuthApi::unreachable()),
    );

    let err = resolver.tokens().get_token().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(resolver.resolve().await.is_none());
}

#[tokio::test]
async fn test_corrupt_cached_user_fails_soft() {
    let h = Harness::new(FakeAuthApi::unreachable()).with_token().await;
    h.store.set_item("auth_user", "{not json").await.unwrap();

    let err = h.resolver.users().get_user().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(h.resolver.resolve().await.is_none());
}

// ============================================================================
// Auth context
// ============================================================================

#[tokio::test]
async fn test_context_starts_loading() {
    let h = Harness::new(FakeAuthApi::unreachable());
    let auth = AuthContext::new(h.resolver.clone());
    assert!(auth.is_auth_loading());
    assert!(auth.user().is_none());

    auth.refresh().await;
    assert_eq!(
        auth.state(),
        SessionState {
            user: None,
            is_auth_loading: false
        }
    );
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_verification() {
    let api = FakeAuthApi {
        delay: Some(Duration::from_millis(50)),
        ..FakeAuthApi::answering(json!({
            "success": true,
            "data": { "id": "u1", "role": "SUPER_ADMIN" }
        }))
    };
    let h = Harness::new(api).with_token().await;
    let auth = AuthContext::new(h.resolver.clone());

    let (a, b, c) = tokio::join!(auth.refresh(), auth.refresh(), auth.refresh());
    assert_eq!(h.api.verify_calls(), 1);
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.map(|u| u.role), Some(Role::SuperAdmin));
    assert!(!auth.is_auth_loading());
    println!("✓ Concurrent refreshes coalesced into one remote call");
}

#[tokio::test]
async fn test_subscribers_see_resolution() {
    let h = Harness::new(FakeAuthApi::answering(json!({
        "success": true,
        "data": { "id": "u1", "role": "PARTNER" }
    })))
    .with_token()
    .await;
    let auth = AuthContext::new(h.resolver.clone());
    let mut rx = auth.subscribe();
    assert!(rx.borrow_and_update().is_auth_loading);

    let task = {
        let auth = auth.clone();
        tokio::spawn(async move { auth.refresh().await })
    };

    let state = rx
        .wait_for(|state| !state.is_auth_loading)
        .await
        .unwrap()
        .clone();
    assert_eq!(state.user.map(|u| u.id), Some("u1".to_string()));
    task.await.unwrap();
}

#[tokio::test]
async fn test_teardown_discards_inflight_result() {
    let api = FakeAuthApi {
        delay: Some(Duration::from_millis(50)),
        ..FakeAuthApi::answering(json!({
            "success": true,
            "data": { "id": "u1", "role": "PARTNER" }
        }))
    };
    let h = Harness::new(api).with_token().await;
    let auth = AuthContext::new(h.resolver.clone());
    let before = auth.state();

    let task = {
        let auth = auth.clone();
        tokio::spawn(async move { auth.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    auth.teardown();

    // The resolution itself still completes
    let resolved = task.await.unwrap();
    assert!(resolved.is_some());

    let after = auth.state();
    assert!(after.user.is_none());
    assert_eq!(after.is_auth_loading, before.is_auth_loading);
    assert!(auth.is_torn_down());
}

#[tokio::test]
async fn test_logout_clears_session_even_when_backend_fails() {
    let partner = User::new("u1", Role::Partner);
    let api = FakeAuthApi {
        logout_fails: true,
        ..FakeAuthApi::unreachable()
    };
    let h = Harness::new(api)
        .with_token()
        .await
        .with_cached_user(&partner)
        .await;
    let auth = AuthContext::start(h.resolver.clone()).await;
    assert_eq!(auth.user(), Some(partner));

    auth.on_logout().await;

    assert_eq!(h.api.logout_calls.load(Ordering::SeqCst), 1);
    assert!(auth.user().is_none());
    assert!(!auth.is_auth_loading());
    assert!(h.token().await.is_none());
    assert!(h.cached_user().await.is_none());
    println!("✓ Local logout succeeds when the backend call fails");
}

#[tokio::test]
async fn test_logout_without_token_skips_backend() {
    let h = Harness::new(FakeAuthApi::unreachable());
    let auth = AuthContext::start(h.resolver.clone()).await;

    auth.on_logout().await;
    assert_eq!(h.api.logout_calls.load(Ordering::SeqCst), 0);
    assert!(auth.user().is_none());
}

#[tokio::test]
async fn test_sign_out_locally_drops_token() {
    let partner = User::new("u1", Role::User);
    let h = Harness::new(FakeAuthApi::unreachable())
        .with_token()
        .await
        .with_cached_user(&partner)
        .await;
    let auth = AuthContext::start(h.resolver.clone()).await;
    assert!(auth.user().is_some());

    assert!(auth.sign_out_locally().await.is_none());
    assert!(auth.user().is_none());
    assert_eq!(h.api.logout_calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn test_request_otp_normalizes_phone() {
    let h = Harness::new(FakeAuthApi::unreachable());
    let auth = AuthContext::new(h.resolver.clone());

    let message = auth.request_otp("+91 98765-43210").await.unwrap();
    assert_eq!(message, "OTP sent to your phone");

    let err = auth.request_otp("12345").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_login_persists_token_and_resolves() {
    let stale = User::new("old", Role::User);
    let api = FakeAuthApi::answering(json!({
        "success": true,
        "data": { "id": "u1", "role": "PARTNER" }
    }));
    let h = Harness::new(api).with_cached_user(&stale).await;
    let auth = AuthContext::new(h.resolver.clone());

    let user = auth.login("9876543210", "123456").await.unwrap();
    assert_eq!(user.as_ref().map(|u| u.id.as_str()), Some("u1"));
    assert_eq!(h.token().await.unwrap().expose(), "fresh-token");
    assert_eq!(h.cached_user().await.map(|u| u.id), Some("u1".to_string()));

    let logins = h.api.logins.lock().unwrap().clone();
    assert_eq!(logins[0].phone, "9876543210");
    assert_eq!(logins[0].otp.as_deref(), Some("123456"));
}

#[tokio::test]
async fn test_login_with_wrong_otp_keeps_session_empty() {
    let h = Harness::new(FakeAuthApi::unreachable());
    let auth = AuthContext::new(h.resolver.clone());

    let err = auth.login("9876543210", "000000").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Api);
    assert!(err.to_string().contains("Invalid OTP"));
    assert!(h.token().await.is_none());

    let err = auth.login("9876543210", "12ab56").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

// ============================================================================
// Overlapping operations
// ============================================================================

#[tokio::test]
async fn test_refresh_during_logout_does_not_restore_user() {
    let partner = User::new("u1", Role::Partner);
    let api = FakeAuthApi {
        delay: Some(Duration::from_millis(80)),
        logout_delay: Some(Duration::from_millis(30)),
        ..FakeAuthApi::answering(json!({
            "success": true,
            "data": { "id": "u1", "role": "PARTNER" }
        }))
    };
    let h = Harness::new(api)
        .with_token()
        .await
        .with_cached_user(&partner)
        .await;
    let auth = AuthContext::start(h.resolver.clone()).await;
    assert_eq!(auth.user(), Some(partner));

    // Record whether a user is published for each state after logout starts
    let mut rx = auth.subscribe();
    rx.borrow_and_update();
    let seen = tokio::spawn(async move {
        let mut users = Vec::new();
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            users.push(state.user.is_some());
            if state.user.is_none() && !state.is_auth_loading {
                break;
            }
        }
        users
    });

    let logout = {
        let auth = auth.clone();
        tokio::spawn(async move { auth.on_logout().await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert!(auth.refresh().await.is_none());
    logout.await.unwrap();

    assert_eq!(
        auth.state(),
        SessionState {
            user: None,
            is_auth_loading: false
        }
    );
    assert!(h.token().await.is_none());
    assert!(h.cached_user().await.is_none());
    assert_eq!(h.api.logout_calls.load(Ordering::SeqCst), 1);

    let users = tokio::time::timeout(Duration::from_secs(1), seen)
        .await
        .unwrap()
        .unwrap();
    let cleared = users.iter().position(|has_user| !has_user).unwrap();
    assert!(
        !users[cleared..].contains(&true),
        "user published again after logout cleared it: {:?}",
        users
    );
    println!("✓ Refresh overlapping logout stays signed out");
}

#[tokio::test]
async fn test_sign_out_locally_during_refresh_stays_signed_out() {
    let api = FakeAuthApi {
        delay: Some(Duration::from_millis(50)),
        ..FakeAuthApi::answering(json!({
            "success": true,
            "data": { "id": "u1", "role": "USER" }
        }))
    };
    let h = Harness::new(api).with_token().await;
    let auth = AuthContext::new(h.resolver.clone());

    let refresh = {
        let auth = auth.clone();
        tokio::spawn(async move { auth.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;

    assert!(auth.sign_out_locally().await.is_none());

    // The earlier resolution verified the token before it was dropped
    let earlier = refresh.await.unwrap();
    assert_eq!(earlier.map(|u| u.id), Some("u1".to_string()));

    assert!(auth.user().is_none());
    assert!(!auth.is_auth_loading());
    assert!(h.token().await.is_none());
    assert!(h.cached_user().await.is_none());
    assert_eq!(h.api.verify_calls(), 1);
}

#[tokio::test]
async fn test_login_during_refresh_returns_new_user() {
    let api = FakeAuthApi {
        delay: Some(Duration::from_millis(50)),
        ..FakeAuthApi::answering(json!({ "success": false, "message": "Token expired" }))
    };
    let h = Harness::new(api).with_token().await;
    let auth = AuthContext::new(h.resolver.clone());

    let refresh = {
        let auth = auth.clone();
        tokio::spawn(async move { auth.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;

    let user = auth.login("9876543210", "123456").await.unwrap();
    assert_eq!(user.map(|u| u.id), Some("u1".to_string()));

    // The expired token was rejected before the new one was stored
    assert!(refresh.await.unwrap().is_none());
    assert_eq!(h.token().await.unwrap().expose(), "fresh-token");
    assert_eq!(auth.user().map(|u| u.role), Some(Role::Partner));
    assert!(!auth.is_auth_loading());
    assert_eq!(h.api.verify_calls(), 2);
    println!("✓ Login overlapping a refresh resolves the new account");
}
