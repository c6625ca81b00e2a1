//! Cached user profile persistence

use std::sync::Arc;

use super::KeyValueStore;
use crate::auth::User;
use crate::error::{Error, Result};

/// Persists the last verified user as JSON
#[derive(Clone)]
pub struct UserCache {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl UserCache {
    pub fn new(store: Arc<dyn KeyValueStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    pub async fn save_user(&self, user: &User) -> Result<()> {
        let json = serde_json::to_string(user)
            .map_err(|e| Error::Storage(format!("Failed to save user: {}", e)))?;
        self.store.set_item(&self.key, &json).await
    }

    /// Read the cached user.
    ///
    /// A value that no longer parses is reported as a storage error rather
    /// than silently treated as absent.
    pub async fn get_user(&self) -> Result<Option<User>> {
        match self.store.get_item(&self.key).await? {
            Some(json) if !json.trim().is_empty() => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| Error::Storage(format!("Failed to retrieve user: {}", e))),
            _ => Ok(None),
        }
    }

    pub async fn remove_user(&self) -> Result<()> {
        self.store.remove_item(&self.key).await
    }
}
