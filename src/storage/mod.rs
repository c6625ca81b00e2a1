//! Durable local storage for the auth token and cached user
//!
//! Everything above this module talks to a [`KeyValueStore`], a small async
//! string store with the same three operations the mobile app's storage
//! offers. Failures are always reported as [`Error::Storage`] so callers can
//! tell a broken store apart from an empty one.
//!
//! [`Error::Storage`]: crate::error::Error::Storage

mod file;
mod memory;
mod token;
mod user;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use token::TokenStore;
pub use user::UserCache;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// Async key-value persistence
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` means the key is not set.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// Build the token store and user cache described by the config,
/// sharing one file store between them.
pub fn open_stores(config: &StorageConfig) -> (TokenStore, UserCache) {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.dir));
    (
        TokenStore::new(Arc::clone(&store), &config.token_key),
        UserCache::new(store, &config.user_key),
    )
}

/// Keys become file names, so only a conservative character set is allowed
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');

    if valid {
        Ok(())
    } else {
        Err(Error::Storage(format!("Invalid storage key: {:?}", key)))
    }
}
