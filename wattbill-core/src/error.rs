//! Core error types for wattbill.

use thiserror::Error;

/// Core error type for wattbill domain operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The Green Button download contained no meter readings.
    #[error("no meter readings in Green Button data")]
    NoReadings,

    /// Parsed data violates a domain invariant.
    #[error("invalid data: {0}")]
    InvalidData(String),
}
