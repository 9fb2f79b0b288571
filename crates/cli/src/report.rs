//! Prediction reports

use inference_engine::{InferenceError, InferenceService};
use organism_record::{field_kind, FieldKind, FieldValue, OrganismRecord, ScoredRecord};
use serde::Serialize;
use std::sync::Arc;
use storage::Repository;
use tracing::{debug, error, warn};

/// Prediction merged with the most similar stored organisms
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub input_organism: OrganismRecord,
    pub is_pathogen_prediction: bool,
    pub pathogen_probability: f64,
    pub similar_organisms: Vec<ScoredRecord>,
}

/// One batch result, in input order
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Report(PredictionReport),
    Failed {
        input_organism: OrganismRecord,
        error: String,
    },
}

impl BatchEntry {
    pub fn is_failure(&self) -> bool {
        matches!(self, BatchEntry::Failed { .. })
    }
}

/// Predict one organism and attach its nearest stored neighbours.
///
/// Ranking is best-effort: a repository read failure leaves
/// `similar_organisms` empty.
pub fn build_report(
    service: &InferenceService,
    repository: &Repository,
    query: OrganismRecord,
    top_n: usize,
    sample_limit: usize,
) -> Result<PredictionReport, InferenceError> {
    check_input(&query);
    let prediction = service.predict(&query)?;

    let candidates = repository.sample(sample_limit).unwrap_or_else(|e| {
        warn!("Could not read stored organisms: {}", e);
        Vec::new()
    });
    let similar_organisms = service.rank(&query, &candidates, top_n);

    Ok(PredictionReport {
        input_organism: query,
        is_pathogen_prediction: prediction.is_pathogen(),
        pathogen_probability: prediction.probability,
        similar_organisms,
    })
}

/// Run every query on the blocking pool against one shared service
pub async fn run_batch(
    service: Arc<InferenceService>,
    repository: Arc<Repository>,
    queries: Vec<OrganismRecord>,
    top_n: usize,
    sample_limit: usize,
) -> Vec<BatchEntry> {
    let handles: Vec<_> = queries
        .into_iter()
        .map(|query| {
            let service = Arc::clone(&service);
            let repository = Arc::clone(&repository);
            let input = query.clone();
            let handle = tokio::task::spawn_blocking(move || {
                build_report(&service, &repository, query, top_n, sample_limit)
            });
            (input, handle)
        })
        .collect();

    let mut entries = Vec::with_capacity(handles.len());
    for (input, handle) in handles {
        let entry = match handle.await {
            Ok(Ok(report)) => BatchEntry::Report(report),
            Ok(Err(e)) => BatchEntry::Failed {
                input_organism: input,
                error: e.to_string(),
            },
            Err(e) => {
                error!("Batch task for {} failed: {}", input.identity(), e);
                BatchEntry::Failed {
                    input_organism: input,
                    error: format!("task failed: {e}"),
                }
            }
        };
        entries.push(entry);
    }
    entries
}

/// Log fields that do not match the organism trait schema
fn check_input(record: &OrganismRecord) {
    for (name, value) in record.iter() {
        match (field_kind(name), value) {
            (None, _) => debug!("{}: field {} is outside the organism schema", record.identity(), name),
            (Some(kind), Some(value)) if !kind_matches(kind, value) => warn!(
                "{}: field {} holds a {} value, expected {:?}",
                record.identity(),
                name,
                value.type_name(),
                kind
            ),
            _ => {}
        }
    }
}

fn kind_matches(kind: FieldKind, value: &FieldValue) -> bool {
    match (kind, value) {
        (FieldKind::Text, FieldValue::Text(_)) => true,
        (FieldKind::Bool, FieldValue::Bool(_)) => true,
        (FieldKind::Number, FieldValue::Number(_)) => true,
        (FieldKind::Number, FieldValue::Text(_)) => value.as_f64().is_some(),
        _ => false,
    }
}
