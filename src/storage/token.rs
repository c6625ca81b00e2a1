//! Auth token persistence

use std::sync::Arc;

use super::KeyValueStore;
use crate::auth::AuthToken;
use crate::error::Result;

/// Persists the opaque auth token under a single key
#[derive(Clone)]
pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl TokenStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    /// Persist the token, replacing any previous one
    pub async fn save_token(&self, token: &AuthToken) -> Result<()> {
        self.store.set_item(&self.key, token.expose()).await
    }

    /// Read the stored token. A blank value counts as no token.
    pub async fn get_token(&self) -> Result<Option<AuthToken>> {
        Ok(self
            .store
            .get_item(&self.key)
            .await?
            .and_then(AuthToken::new))
    }

    pub async fn remove_token(&self) -> Result<()> {
        self.store.remove_item(&self.key).await
    }
}
