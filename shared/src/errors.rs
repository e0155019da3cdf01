//! Error types for the wellness tracker domain

use thiserror::Error;

/// Errors raised while interpreting user-supplied scheduling data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid clock time '{0}', expected HH:MM")]
    InvalidClockTime(String),

    #[error("UTC offset of {0} minutes is out of range")]
    InvalidOffset(i32),

    #[error("Invalid notification window: {0}")]
    InvalidWindow(String),
}
