//! Pathogenicity Inference Engine
//!
//! Loads a fitted preprocessing + classification artifact once per process
//! and serves pathogenicity predictions and similarity rankings from it.

mod artifact;
mod classifier;
mod error;
mod loader;
mod predictor;
mod ranker;
mod service;

#[cfg(test)]
mod fixtures;

pub use artifact::{ArtifactBundle, ArtifactShape, ShapeKind};
pub use classifier::{Classifier, ClassifierError, GradientBoosting, LogisticRegression, Tree, TreeNode};
pub use error::{InferenceError, LoadFailure};
pub use loader::ArtifactLoader;
pub use predictor::{PathogenicityPredictor, Prediction};
pub use ranker::{cosine_similarity, SimilarityRanker};
pub use service::{InferenceService, ServiceStatus};
