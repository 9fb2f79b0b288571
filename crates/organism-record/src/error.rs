//! Record Error Types

use thiserror::Error;

/// Errors while building records from external input
#[derive(Debug, Error)]
pub enum RecordError {
    /// Input was not an object of scalar fields
    #[error("Invalid record format: {0}")]
    InvalidFormat(String),

    /// Input parsed as JSON but was not a record or list of records
    #[error("Expected {expected}, got {actual}")]
    UnexpectedShape {
        expected: &'static str,
        actual: &'static str,
    },
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::InvalidFormat(e.to_string())
    }
}
