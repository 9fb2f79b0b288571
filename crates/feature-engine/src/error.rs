//! Feature Error Types

use thiserror::Error;

/// Errors while building schemas or transforming aligned frames
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Feature schema is empty")]
    EmptySchema,

    #[error("Duplicate feature name in schema: {0}")]
    DuplicateFeature(String),

    /// Column the transform needs is not in the frame
    #[error("Column not present in input: {0}")]
    MissingColumn(String),

    /// Missing value in a column with no fill value
    #[error("Missing value in column {column} (row {row}) and no fill value is fitted")]
    MissingValue { column: String, row: usize },

    #[error("Column {column} (row {row}) expects a numeric value, got {found}")]
    TypeMismatch {
        column: String,
        row: usize,
        found: &'static str,
    },

    /// Infinite or NaN numeric input
    #[error("Column {column} (row {row}) holds a non-finite value")]
    NonFinite { column: String, row: usize },

    #[error("Unknown category {value:?} in column {column}")]
    UnknownCategory { column: String, value: String },

    /// Fitted transform parameters are inconsistent
    #[error("Invalid fitted transform: {0}")]
    InvalidTransform(String),
}
