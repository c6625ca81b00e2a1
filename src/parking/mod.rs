//! Parking lots owned by a partner

mod client;

pub use client::ParkingApi;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// A parking lot as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parking {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    /// Hourly price, sent by the backend as a string or a number
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: String,
    #[serde(default)]
    pub pin_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub slots: Vec<serde_json::Value>,
}

fn deserialize_price<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

impl Parking {
    pub fn is_active(&self) -> bool {
        self.status.as_deref() == Some("ACTIVE")
    }

    /// Number of bookable spots
    pub fn spot_count(&self) -> usize {
        self.slots.len()
    }
}

/// Fields a partner fills in to add or edit a lot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingForm {
    pub name: String,
    pub address: String,
    pub city: String,
    pub price: String,
    pub pin_code: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

fn pin_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[1-9][0-9]{5}$").expect("pin code pattern is valid"))
}

impl ParkingForm {
    /// Check the form, collecting every problem rather than stopping at the first
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() {
            problems.push("name is required".to_string());
        }
        if self.address.trim().is_empty() {
            problems.push("address is required".to_string());
        }
        if self.city.trim().is_empty() {
            problems.push("city is required".to_string());
        }
        match self.price.trim().parse::<f64>() {
            Ok(price) if price.is_finite() && price > 0.0 => {}
            _ => problems.push("price must be a positive number".to_string()),
        }
        if !pin_code_pattern().is_match(self.pin_code.trim()) {
            problems.push("pin code must be 6 digits".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(problems.join(", ")))
        }
    }
}

impl From<&Parking> for ParkingForm {
    fn from(parking: &Parking) -> Self {
        Self {
            name: parking.name.clone(),
            address: parking.address.clone(),
            city: parking.city.clone(),
            price: parking.price.clone(),
            pin_code: parking.pin_code.clone(),
            description: parking.description.clone().unwrap_or_default(),
            features: parking.features.clone().unwrap_or_default(),
            user_id: parking.user_id.clone(),
        }
    }
}
