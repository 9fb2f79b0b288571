//! Shared test setup

use inference_engine::{ArtifactLoader, InferenceService};
use organism_record::OrganismRecord;
use serde_json::json;
use storage::Repository;

pub fn artifact_json() -> serde_json::Value {
    json!({"named_steps": {
        "preprocessor": {
            "feature_names_in": ["gram_stain", "shape", "optimal_temperature"],
            "transformers": [
                {"kind": "numeric", "columns": ["optimal_temperature"],
                 "fill": [30.0], "mean": [30.0], "scale": [5.0]},
                {"kind": "categorical", "columns": ["gram_stain", "shape"],
                 "fill": "missing",
                 "categories": [["Negative", "Positive"], ["Coccus", "Rod"]],
                 "handle_unknown": "ignore"}
            ]
        },
        "classifier": {
            "kind": "logistic_regression",
            "classes": [0, 1],
            "coef": [[0.5, -1.5, 1.5, -1.0, 1.0]],
            "intercept": [0.0]
        }
    }})
}

/// Uninitialized service over an artifact in a fresh temp dir
pub fn service() -> (tempfile::TempDir, InferenceService) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bacteria_classifier.json");
    std::fs::write(&path, serde_json::to_vec(&artifact_json()).unwrap()).unwrap();
    (dir, InferenceService::new(ArtifactLoader::new([path])))
}

pub fn organism(id: &str, gram_stain: &str, shape: &str, optimal_temperature: f64) -> OrganismRecord {
    OrganismRecord::new()
        .with("bacteria_id", id)
        .with("gram_stain", gram_stain)
        .with("shape", shape)
        .with("optimal_temperature", optimal_temperature)
}

pub fn repository() -> Repository {
    let repository = Repository::new();
    repository
        .extend([
            organism("A", "Positive", "Rod", 37.0),
            organism("B", "Negative", "Coccus", 20.0),
            organism("C", "Positive", "Coccus", 30.0),
        ])
        .unwrap();
    repository
}
