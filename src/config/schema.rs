//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// Backend REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

/// Endpoint paths, relative to `api.base_url`.
///
/// `:id` and `:userId` placeholders are substituted per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_current_user")]
    pub current_user: String,

    #[serde(default = "default_logout")]
    pub logout: String,

    #[serde(default = "default_login_init")]
    pub login_init: String,

    #[serde(default = "default_login")]
    pub login: String,

    #[serde(default = "default_parking_by_user")]
    pub parking_by_user: String,

    #[serde(default = "default_parking_by_id")]
    pub parking_by_id: String,

    #[serde(default = "default_add_parking")]
    pub add_parking: String,

    #[serde(default = "default_parking_by_id")]
    pub update_parking: String,

    #[serde(default = "default_plan")]
    pub plan: String,

    #[serde(default = "default_subscribe")]
    pub subscribe: String,
}

fn default_current_user() -> String {
    "/auth/me".to_string()
}

fn default_logout() -> String {
    "/auth/logout".to_string()
}

fn default_login_init() -> String {
    "/auth/login/init".to_string()
}

fn default_login() -> String {
    "/auth/login".to_string()
}

fn default_parking_by_user() -> String {
    "/parking/user/:userId".to_string()
}

fn default_parking_by_id() -> String {
    "/parking/:id".to_string()
}

fn default_add_parking() -> String {
    "/parking".to_string()
}

fn default_plan() -> String {
    "/plan".to_string()
}

fn default_subscribe() -> String {
    "/plan/subscribe".to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            current_user: default_current_user(),
            logout: default_logout(),
            login_init: default_login_init(),
            login: default_login(),
            parking_by_user: default_parking_by_user(),
            parking_by_id: default_parking_by_id(),
            add_parking: default_add_parking(),
            update_parking: default_parking_by_id(),
            plan: default_plan(),
            subscribe: default_subscribe(),
        }
    }
}

/// Durable local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one file per persisted key
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_token_key")]
    pub token_key: String,

    #[serde(default = "default_user_key")]
    pub user_key: String,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./.parkgate")
}

fn default_token_key() -> String {
    "auth_token".to_string()
}

fn default_user_key() -> String {
    "auth_user".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            token_key: default_token_key(),
            user_key: default_user_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://parking.example.com/api"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://parking.example.com/api");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.api.endpoints.current_user, "/auth/me");
        assert_eq!(config.storage.token_key, "auth_token");
    }

    #[test]
    fn test_endpoint_override() {
        let config: Config = toml::from_str(
            r#"
            [api.endpoints]
            current_user = "/v2/me"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.endpoints.current_user, "/v2/me");
        assert_eq!(config.api.endpoints.logout, "/auth/logout");
    }
}
