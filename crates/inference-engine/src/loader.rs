//! Artifact Loader

use crate::{ArtifactBundle, LoadFailure};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Loads the pipeline artifact from the first usable candidate path
#[derive(Debug, Clone, Default)]
pub struct ArtifactLoader {
    candidates: Vec<PathBuf>,
}

impl ArtifactLoader {
    /// Create a loader over candidate paths, tried in order
    pub fn new<I, P>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Load from the first candidate that yields a usable bundle.
    ///
    /// Missing files are skipped. If every candidate is missing the result
    /// is [`LoadFailure::NotFound`]; otherwise the last read or decode
    /// failure is reported.
    pub fn load(&self) -> Result<ArtifactBundle, LoadFailure> {
        info!("Attempting to load artifact from paths: {:?}", self.candidates);

        let mut last_failure = None;
        for path in &self.candidates {
            match Self::load_path(path) {
                Ok(bundle) => return Ok(bundle),
                Err(LoadFailure::NotFound { .. }) => {
                    warn!("Artifact file not found at: {}", path.display());
                }
                Err(failure) => {
                    error!("{}", failure);
                    last_failure = Some(failure);
                }
            }
        }

        error!("Failed to load artifact from any configured path");
        Err(last_failure.unwrap_or_else(|| LoadFailure::NotFound {
            paths: self.candidates.clone(),
        }))
    }

    /// Load a single artifact file. Never writes to the file.
    pub fn load_path(path: &Path) -> Result<ArtifactBundle, LoadFailure> {
        if !path.is_file() {
            return Err(LoadFailure::NotFound {
                paths: vec![path.to_path_buf()],
            });
        }

        info!("Loading artifact from: {}", path.display());
        let corrupt = |reason: String| LoadFailure::Corrupt {
            path: path.to_path_buf(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
        let document: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| corrupt(e.to_string()))?;

        let bundle = ArtifactBundle::from_document(document).ok_or_else(|| {
            LoadFailure::Unrecognized {
                path: path.to_path_buf(),
            }
        })?;

        match bundle.schema() {
            Some(schema) => info!(
                "Artifact loaded ({} shape, {} input features)",
                bundle.shape().map_or_else(|| "?".to_string(), |s| s.to_string()),
                schema.len()
            ),
            None => warn!("Artifact loaded without a fitted feature schema; records will not be aligned"),
        }
        Ok(bundle.with_source(path))
    }
}
