//! Backend REST API access

mod client;

pub use client::{fill_path, ApiClient};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Envelope every backend endpoint answers with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,

    pub data: Option<T>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Issued by the login endpoint only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Server message, or a fallback describing the failed call
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }

    /// Unwrap the payload of a successful response
    pub fn into_data(self, what: &str) -> Result<T> {
        if !self.success {
            return Err(Error::Api(self.message_or(&format!("{} failed", what))));
        }
        self.data
            .ok_or_else(|| Error::Api(format!("{} returned no data", what)))
    }

    /// Check a response that carries no payload
    pub fn ensure_success(&self, what: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            Err(Error::Api(self.message_or(&format!("{} failed", what))))
        }
    }
}
