//! Input validation functions
//!
//! Plain validators return `Result<(), String>`; `validate_clock_time_field`
//! adapts the clock-time check for `#[validate(custom(...))]`.

use chrono::NaiveTime;
use validator::ValidationError;

/// Smallest custom reminder interval a user may choose, in hours
pub const MIN_CUSTOM_INTERVAL_HOURS: f64 = 0.5;
/// Largest custom reminder interval a user may choose, in hours
pub const MAX_CUSTOM_INTERVAL_HOURS: f64 = 12.0;

/// Parse a local clock time in `HH:MM` form
pub fn parse_clock_time(value: &str) -> Result<NaiveTime, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Time cannot be empty".to_string());
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .map_err(|_| format!("Invalid time '{}'. Use HH:MM", value))
}

/// Validate a local clock time in `HH:MM` form
pub fn validate_clock_time(value: &str) -> Result<(), String> {
    parse_clock_time(value).map(|_| ())
}

/// Validate a custom water reminder interval (hours)
pub fn validate_custom_interval_hours(hours: f64) -> Result<(), String> {
    if hours.is_nan() || hours.is_infinite() {
        return Err("Interval must be a valid number".to_string());
    }
    if hours < MIN_CUSTOM_INTERVAL_HOURS {
        return Err("Interval must be at least 30 minutes".to_string());
    }
    if hours > MAX_CUSTOM_INTERVAL_HOURS {
        return Err("Interval must be at most 12 hours".to_string());
    }
    Ok(())
}

/// Validate a device push token
pub fn validate_device_token(token: &str) -> Result<(), String> {
    if token.trim().is_empty() {
        return Err("Device token cannot be empty".to_string());
    }
    if token.len() > 4096 {
        return Err("Device token too long".to_string());
    }
    if token.chars().any(char::is_whitespace) {
        return Err("Device token cannot contain whitespace".to_string());
    }
    Ok(())
}

pub fn validate_clock_time_field(value: &str) -> Result<(), ValidationError> {
    validate_clock_time(value).map_err(|message| {
        let mut error = ValidationError::new("clock_time");
        error.message = Some(message.into());
        error
    })
}
