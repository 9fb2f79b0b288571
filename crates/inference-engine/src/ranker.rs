//! Similarity Ranker

use crate::ArtifactBundle;
use feature_engine::FeatureError;
use ndarray::{ArrayView1, Axis};
use organism_record::{OrganismRecord, ScoredRecord};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
enum RankError {
    #[error("{0}")]
    Feature(#[from] FeatureError),
    #[error("query has {query} features but candidates have {candidates}")]
    WidthMismatch { query: usize, candidates: usize },
    #[error("non-finite similarity for candidate {0}")]
    NonFinite(usize),
}

/// Cosine similarity of two vectors.
///
/// A zero-magnitude vector has no direction and scores 0.0 against
/// everything. Results are clamped to `[-1, 1]`.
pub fn cosine_similarity(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(&b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Ranks candidate organisms by similarity to a query in preprocessed
/// feature space.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityRanker<'a> {
    bundle: &'a ArtifactBundle,
}

impl<'a> SimilarityRanker<'a> {
    pub fn new(bundle: &'a ArtifactBundle) -> Self {
        Self { bundle }
    }

    /// Top `top_n` candidates by descending similarity.
    ///
    /// Ties keep candidate input order. Any failure yields an empty list:
    /// a partially computed ranking is never returned.
    pub fn rank(
        &self,
        query: &OrganismRecord,
        candidates: &[OrganismRecord],
        top_n: usize,
    ) -> Vec<ScoredRecord> {
        if candidates.is_empty() || top_n == 0 {
            debug!("Nothing to rank (candidates={}, top_n={})", candidates.len(), top_n);
            return Vec::new();
        }

        match self.try_rank(query, candidates, top_n) {
            Ok(ranked) => ranked,
            Err(e) => {
                warn!("Error finding similar organisms for {}: {}", query.identity(), e);
                Vec::new()
            }
        }
    }

    fn try_rank(
        &self,
        query: &OrganismRecord,
        candidates: &[OrganismRecord],
        top_n: usize,
    ) -> Result<Vec<ScoredRecord>, RankError> {
        let aligner = self.bundle.aligner();
        let preprocessor = self.bundle.preprocessor();

        let query_x = preprocessor.transform(&aligner.align(query))?;
        let candidate_x = preprocessor.transform(&aligner.align_batch(candidates))?;
        if query_x.ncols() != candidate_x.ncols() {
            return Err(RankError::WidthMismatch {
                query: query_x.ncols(),
                candidates: candidate_x.ncols(),
            });
        }

        let query_row = query_x.row(0);
        let mut scored = Vec::with_capacity(candidates.len());
        for (i, (row, record)) in candidate_x.axis_iter(Axis(0)).zip(candidates).enumerate() {
            let score = cosine_similarity(query_row, row);
            if !score.is_finite() {
                return Err(RankError::NonFinite(i));
            }
            scored.push(ScoredRecord::new(record.clone(), score));
        }

        // stable: equal scores keep input order
        scored.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(Ordering::Equal)
        });
        scored.truncate(top_n);
        Ok(scored)
    }
}
