//! Shared test artifacts

use crate::ArtifactBundle;
use organism_record::OrganismRecord;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Scaled temperature, one-hot gram stain, one-hot shape: 5 features
pub fn preprocessor_json() -> Value {
    json!({
        "feature_names_in": ["gram_stain", "shape", "optimal_temperature"],
        "transformers": [
            {"kind": "numeric", "columns": ["optimal_temperature"],
             "fill": [30.0], "mean": [30.0], "scale": [5.0]},
            {"kind": "categorical", "columns": ["gram_stain", "shape"],
             "fill": "missing",
             "categories": [["Negative", "Positive"], ["Coccus", "Rod"]],
             "handle_unknown": "ignore"}
        ]
    })
}

pub fn classifier_json() -> Value {
    json!({
        "kind": "logistic_regression",
        "classes": [0, 1],
        "coef": [[0.5, -1.5, 1.5, -1.0, 1.0]],
        "intercept": [0.0]
    })
}

pub fn named_steps_json() -> Value {
    json!({"named_steps": {
        "preprocessor": preprocessor_json(),
        "classifier": classifier_json(),
    }})
}

pub fn bare_pair_json() -> Value {
    json!([preprocessor_json(), classifier_json()])
}

pub fn schemaless_json() -> Value {
    let mut preprocessor = preprocessor_json();
    if let Some(obj) = preprocessor.as_object_mut() {
        obj.remove("feature_names_in");
    }
    json!({"named_steps": {
        "preprocessor": preprocessor,
        "classifier": classifier_json(),
    }})
}

pub fn bundle() -> ArtifactBundle {
    ArtifactBundle::from_document(named_steps_json()).expect("fixture artifact decodes")
}

pub fn degraded_bundle() -> ArtifactBundle {
    ArtifactBundle::from_document(schemaless_json()).expect("fixture artifact decodes")
}

pub fn write_artifact(dir: &Path, name: &str, document: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(document).expect("serialize fixture"))
        .expect("write fixture");
    path
}

pub fn organism(id: &str, gram_stain: &str, shape: &str, optimal_temperature: f64) -> OrganismRecord {
    OrganismRecord::new()
        .with("bacteria_id", id)
        .with("gram_stain", gram_stain)
        .with("shape", shape)
        .with("optimal_temperature", optimal_temperature)
}
