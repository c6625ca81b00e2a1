//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "parkgate.toml";

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "PARKGATE_API_URL";

/// Load configuration from parkgate.toml.
///
/// A missing file is not an error here: every field has a default, so the
/// tool works against a local backend without any setup.
pub fn load_config() -> Result<Config> {
    let mut config = match find_config_file() {
        Ok(path) => load_config_from_path(&path)?,
        Err(Error::ConfigNotFound) => {
            tracing::debug!("No {} found, using defaults", CONFIG_FILENAME);
            Config::default()
        }
        Err(e) => return Err(e),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Save configuration to a specific path
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content =
        toml::to_string_pretty(config).map_err(|e| Error::Config(e.to_string()))?;
    fs::write(path, content)?;
    Ok(())
}

/// Override config values from the environment
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(url) = env::var(API_URL_ENV) {
        if !url.trim().is_empty() {
            config.api.base_url = url.trim().to_string();
        }
    }
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# Parkgate Configuration

[api]
base_url = "${PARKGATE_API_URL:-http://localhost:8080/api}"
timeout_secs = 15

# Endpoint paths are relative to base_url.
# :id and :userId are replaced per request.
[api.endpoints]
current_user = "/auth/me"
logout = "/auth/logout"
login_init = "/auth/login/init"
login = "/auth/login"
parking_by_user = "/parking/user/:userId"
parking_by_id = "/parking/:id"
add_parking = "/parking"
update_parking = "/parking/:id"
plan = "/plan"
subscribe = "/plan/subscribe"

# Durable local storage for the auth token and cached user
[storage]
dir = "./.parkgate"
token_key = "auth_token"
user_key = "auth_user"
"#
}
