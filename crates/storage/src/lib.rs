//! Storage Layer
//!
//! Provides the organism repository the caller samples similarity
//! candidates from.

mod repository;

pub use repository::Repository;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Duplicate bacteria_id: {0}")]
    Duplicate(String),
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
