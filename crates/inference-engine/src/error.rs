//! Inference Error Types

use crate::ClassifierError;
use feature_engine::FeatureError;
use organism_record::OrganismRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why the artifact could not be loaded.
///
/// Every variant leaves the service unavailable until the process restarts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadFailure {
    #[error("Artifact not found at any of: {}", join_paths(.paths))]
    NotFound { paths: Vec<PathBuf> },

    /// The file exists but could not be read or parsed
    #[error("Artifact {} could not be read: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    /// Parsed, but no accepted shape yields both a preprocessor and a classifier
    #[error("Artifact {} has no usable preprocessor/classifier pair", .path.display())]
    Unrecognized { path: PathBuf },
}

impl LoadFailure {
    /// Path the failure refers to, if it concerns a single file
    pub fn path(&self) -> Option<&Path> {
        match self {
            LoadFailure::NotFound { .. } => None,
            LoadFailure::Corrupt { path, .. } | LoadFailure::Unrecognized { path } => Some(path),
        }
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<no candidate paths>".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced by prediction
#[derive(Debug, Error)]
pub enum InferenceError {
    /// No artifact is loaded; replacing the artifact and restarting is the
    /// only recovery, so clients should not retry.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The record could not be turned into a feature vector
    #[error("Feature preparation failed for {}: {source}", .record.identity())]
    FeaturePreparation {
        record: Box<OrganismRecord>,
        #[source]
        source: FeatureError,
    },

    /// The classifier failed on a prepared feature vector
    #[error("Prediction failed: {0}")]
    Prediction(#[from] ClassifierError),
}

impl InferenceError {
    /// Whether an operator (not the client) must act before retrying
    pub fn is_operator_recoverable(&self) -> bool {
        matches!(self, InferenceError::ModelUnavailable(_))
    }
}
