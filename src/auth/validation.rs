//! Login form validation

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Error, Result};

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:\+?91)?([6-9][0-9]{9})$").expect("phone pattern is valid")
    })
}

/// Normalise and validate an Indian mobile number.
///
/// Spaces and dashes are ignored and an optional `+91` prefix is dropped;
/// the result is the bare ten-digit number.
pub fn validate_phone(phone: &str) -> Result<String> {
    let compact: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if compact.is_empty() {
        return Err(Error::Validation("Phone number is required".to_string()));
    }

    phone_pattern()
        .captures(&compact)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| Error::Validation("Enter a valid 10-digit phone number".to_string()))
}

/// Validate a one-time password: exactly six digits
pub fn validate_otp(otp: &str) -> Result<String> {
    let otp = otp.trim();
    if otp.len() != 6 || !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation("OTP must be 6 digits".to_string()));
    }
    Ok(otp.to_string())
}
