//! Session resolution
//!
//! Works out who the current user is: the cached profile first, then the
//! stored token verified against the backend. Resolution never fails
//! outward; every storage, network or verification error ends in "no user".

use std::sync::Arc;

use crate::auth::client::AuthApi;
use crate::auth::models::{AuthToken, User};
use crate::error::{Error, Result};
use crate::storage::{TokenStore, UserCache};

/// Where a resolved session came from
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Adopted from the user cache without a network call
    Cached(User),
    /// Verified against the backend and cached
    Verified(User),
    /// No authenticated user
    Anonymous,
}

impl Resolution {
    pub fn user(&self) -> Option<&User> {
        match self {
            Resolution::Cached(user) | Resolution::Verified(user) => Some(user),
            Resolution::Anonymous => None,
        }
    }

    pub fn into_user(self) -> Option<User> {
        match self {
            Resolution::Cached(user) | Resolution::Verified(user) => Some(user),
            Resolution::Anonymous => None,
        }
    }
}

/// Resolves the current user from local storage and the backend
#[derive(Clone)]
pub struct SessionResolver {
    tokens: TokenStore,
    users: UserCache,
    api: Arc<dyn AuthApi>,
}

impl SessionResolver {
    pub fn new(tokens: TokenStore, users: UserCache, api: Arc<dyn AuthApi>) -> Self {
        Self { tokens, users, api }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn users(&self) -> &UserCache {
        &self.users
    }

    pub fn api(&self) -> &Arc<dyn AuthApi> {
        &self.api
    }

    /// Resolve the current user. Never fails; errors are logged.
    pub async fn resolve(&self) -> Option<User> {
        self.resolve_detailed().await.into_user()
    }

    /// Resolve the current user, reporting where it came from
    pub async fn resolve_detailed(&self) -> Resolution {
        match self.try_resolve().await {
            Ok(resolution) => resolution,
            Err(e) => {
                tracing::error!("Error verifying user: {}", e);
                Resolution::Anonymous
            }
        }
    }

    async fn try_resolve(&self) -> Result<Resolution> {
        if let Some(user) = self.users.get_user().await? {
            if self.tokens.get_token().await?.is_some() {
                tracing::info!("Getting user from storage");
                return Ok(Resolution::Cached(user));
            }
            // The token was removed since this profile was cached
            tracing::info!("Cached user has no token, clearing cache");
            self.users.remove_user().await?;
            return Ok(Resolution::Anonymous);
        }

        let Some(token) = self.tokens.get_token().await? else {
            tracing::info!("No token or user found in storage");
            return Ok(Resolution::Anonymous);
        };

        tracing::info!("Getting user from token");
        match self.verify(&token).await {
            Ok(user) => {
                if let Err(e) = self.users.save_user(&user).await {
                    tracing::warn!("Failed to cache verified user: {}", e);
                } else {
                    tracing::info!("Saved user to storage after fetching");
                }
                Ok(Resolution::Verified(user))
            }
            Err(e) => {
                tracing::error!("User failed to verify: {}", e);
                if let Err(e) = self.tokens.remove_token().await {
                    tracing::error!("Failed to remove rejected token: {}", e);
                }
                Ok(Resolution::Anonymous)
            }
        }
    }

    /// Ask the backend who owns the token
    async fn verify(&self, token: &AuthToken) -> Result<User> {
        let response = self.api.current_user(token).await?;
        if !response.success {
            return Err(Error::VerificationRejected(
                response.message_or("server responded success=false"),
            ));
        }
        response
            .data
            .ok_or_else(|| Error::VerificationRejected("response carried no user".to_string()))
    }
}
