//! Auth context shared with the rest of the application
//!
//! [`AuthContext`] owns the session state and is its only writer. Readers
//! either poll [`AuthContext::state`] or subscribe to changes. One session
//! resolution runs at a time: a `refresh` issued while another is pending
//! joins it instead of starting a second round trip.
//!
//! Resolutions and the operations that rewrite stored credentials (logout,
//! login, local sign-out) take the same session lock, so a resolution either
//! completes before such an operation touches storage or starts after it is
//! done. It never observes or publishes a half-finished logout.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::{watch, Mutex as AsyncMutex};

use crate::auth::models::{AuthToken, LoginRequest, User};
use crate::auth::session::SessionResolver;
use crate::auth::validation::{validate_otp, validate_phone};
use crate::error::{Error, Result};

/// Snapshot of the session as seen by guards and screens
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub user: Option<User>,
    pub is_auth_loading: bool,
}

type PendingResolution = Shared<BoxFuture<'static, Option<User>>>;

/// Cheaply cloneable handle to the session
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: SessionResolver,
    state: watch::Sender<SessionState>,
    pending: Mutex<Option<PendingResolution>>,
    /// Held by a running resolution and by credential-changing operations
    session_lock: Arc<AsyncMutex<()>>,
    torn_down: AtomicBool,
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, Option<PendingResolution>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Publish a new state unless the context has been torn down
    fn publish(&self, update: impl FnOnce(&mut SessionState)) {
        if self.is_torn_down() {
            tracing::debug!("Auth context torn down, discarding session update");
            return;
        }
        self.state.send_modify(update);
    }

    fn finish_resolution(&self, user: Option<User>) {
        self.pending().take();
        self.publish(|state| {
            state.user = user;
            state.is_auth_loading = false;
        });
    }
}

impl AuthContext {
    /// Create a context whose session is not resolved yet.
    ///
    /// `is_auth_loading` stays `true` until the first [`refresh`](Self::refresh)
    /// settles.
    pub fn new(resolver: SessionResolver) -> Self {
        let (state, _) = watch::channel(SessionState {
            user: None,
            is_auth_loading: true,
        });
        Self {
            inner: Arc::new(Inner {
                resolver,
                state,
                pending: Mutex::new(None),
                session_lock: Arc::new(AsyncMutex::new(())),
                torn_down: AtomicBool::new(false),
            }),
        }
    }

    /// Create a context and run the initial resolution
    pub async fn start(resolver: SessionResolver) -> Self {
        tracing::info!("Initializing auth");
        let context = Self::new(resolver);
        context.refresh().await;
        context
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    pub fn is_auth_loading(&self) -> bool {
        self.inner.state.borrow().is_auth_loading
    }

    /// Watch session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn resolver(&self) -> &SessionResolver {
        &self.inner.resolver
    }

    /// Currently stored token, if any
    pub async fn token(&self) -> Result<Option<AuthToken>> {
        self.inner.resolver.tokens().get_token().await
    }

    /// Re-resolve the session.
    ///
    /// Joins the in-flight resolution if there is one. After
    /// [`teardown`](Self::teardown) this is a no-op returning the last user.
    pub async fn refresh(&self) -> Option<User> {
        if self.inner.is_torn_down() {
            return self.user();
        }

        let pending = {
            let mut slot = self.inner.pending();
            match slot.as_ref() {
                Some(pending) => {
                    tracing::debug!("Joining in-flight session resolution");
                    pending.clone()
                }
                None => {
                    self.inner.publish(|state| state.is_auth_loading = true);
                    let pending = self.start_resolution();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    fn start_resolution(&self) -> PendingResolution {
        let resolver = self.inner.resolver.clone();
        let session_lock = Arc::clone(&self.inner.session_lock);
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);

        // Spawned so a resolution holding the session lock keeps making
        // progress even if every caller awaiting it goes away
        let task = tokio::spawn(async move {
            let _guard = session_lock.lock().await;
            let user = resolver.resolve().await;
            if let Some(inner) = inner.upgrade() {
                inner.finish_resolution(user.clone());
            }
            user
        });

        async move {
            match task.await {
                Ok(user) => user,
                Err(e) => {
                    tracing::error!("Session resolution task failed: {}", e);
                    None
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Log out.
    ///
    /// The backend is told when a token is stored, but local state is
    /// cleared whatever it answers: logging out always succeeds locally.
    pub async fn on_logout(&self) {
        if self.inner.is_torn_down() {
            return;
        }
        let _guard = self.inner.session_lock.lock().await;
        self.inner.publish(|state| state.is_auth_loading = true);

        let resolver = &self.inner.resolver;
        match resolver.tokens().get_token().await {
            Ok(Some(token)) => match resolver.api().logout(&token).await {
                Ok(response) if response.success => tracing::info!("Logout successfully"),
                Ok(response) => tracing::warn!(
                    "Backend refused logout, logging out locally: {}",
                    response.message_or("success=false")
                ),
                Err(e) => tracing::error!("Failed to logout but still logged out locally: {}", e),
            },
            Ok(None) => tracing::debug!("No token stored, skipping remote logout"),
            Err(e) => tracing::error!("Failed to read token for logout: {}", e),
        }

        if let Err(e) = resolver.tokens().remove_token().await {
            tracing::error!("Failed to remove token: {}", e);
        }
        if let Err(e) = resolver.users().remove_user().await {
            tracing::error!("Failed to remove cached user: {}", e);
        }

        // A resolution queued behind this logout is still to run
        let still_resolving = self.inner.pending().is_some();
        self.inner.publish(|state| {
            state.user = None;
            state.is_auth_loading = still_resolving;
        });
    }

    /// Drop the stored token and re-resolve, without calling the backend.
    ///
    /// This is the escape hatch offered to a user stuck on the forbidden page.
    pub async fn sign_out_locally(&self) -> Option<User> {
        {
            let _guard = self.inner.session_lock.lock().await;
            if let Err(e) = self.inner.resolver.tokens().remove_token().await {
                tracing::error!("Failed to remove token: {}", e);
            }
        }
        self.refresh().await
    }

    /// Ask the backend to send a one-time password to `phone`.
    ///
    /// Returns the server's message.
    pub async fn request_otp(&self, phone: &str) -> Result<String> {
        let request = LoginRequest {
            phone: validate_phone(phone)?,
            otp: None,
        };
        let response = self.inner.resolver.api().login_init(&request).await?;
        response.ensure_success("Login init")?;
        Ok(response.message_or("OTP sent"))
    }

    /// Log in with phone and OTP, persist the token and resolve the session
    pub async fn login(&self, phone: &str, otp: &str) -> Result<Option<User>> {
        let request = LoginRequest {
            phone: validate_phone(phone)?,
            otp: Some(validate_otp(otp)?),
        };
        let response = self.inner.resolver.api().login(&request).await?;
        response.ensure_success("Login")?;

        let token = response
            .token
            .as_deref()
            .and_then(AuthToken::new)
            .ok_or_else(|| Error::Api("Login response carried no token".to_string()))?;

        {
            let _guard = self.inner.session_lock.lock().await;
            let resolver = &self.inner.resolver;
            resolver.tokens().save_token(&token).await?;
            // A profile cached for a previous account must not be adopted
            resolver.users().remove_user().await?;
        }

        tracing::info!("Logged in, resolving session");
        Ok(self.refresh().await)
    }

    /// Detach the context. Resolutions still in flight finish but their
    /// results are discarded, and later calls leave the state untouched.
    pub fn teardown(&self) {
        self.inner.torn_down.store(true, Ordering::SeqCst);
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.is_torn_down()
    }
}
