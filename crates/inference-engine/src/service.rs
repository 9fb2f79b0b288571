//! Inference Service lifecycle

use crate::{
    ArtifactBundle, ArtifactLoader, InferenceError, LoadFailure, PathogenicityPredictor,
    Prediction, SimilarityRanker,
};
use feature_engine::FeatureSchema;
use organism_record::{OrganismRecord, ScoredRecord};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Lifecycle state of the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Constructed, nothing loaded yet
    Uninitialized,
    /// The one-shot load is in progress
    Loading,
    /// Preprocessor, classifier and feature schema are loaded
    Ready,
    /// Loaded without a feature schema; records are not aligned
    Degraded,
    /// Loading failed; a restart is the only recovery
    Unavailable,
}

impl ServiceStatus {
    /// Whether predictions can be served
    pub fn is_usable(&self) -> bool {
        matches!(self, ServiceStatus::Ready | ServiceStatus::Degraded)
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceStatus::Uninitialized => "uninitialized",
            ServiceStatus::Loading => "loading",
            ServiceStatus::Ready => "ready",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Unavailable => "unavailable",
        })
    }
}

type LoadOutcome = Result<ArtifactBundle, LoadFailure>;

/// Process-wide inference handle.
///
/// Construct one at startup and share it by reference (typically in an
/// `Arc`). The artifact is loaded exactly once, either eagerly through
/// [`InferenceService::initialize`] or on first use; concurrent first callers
/// wait for that single load. The loaded bundle is never mutated or
/// replaced afterwards.
pub struct InferenceService {
    loader: ArtifactLoader,
    outcome: OnceLock<LoadOutcome>,
    loading: AtomicBool,
}

impl InferenceService {
    /// Create an uninitialized service that will load through `loader`
    pub fn new(loader: ArtifactLoader) -> Self {
        info!("Creating inference service");
        Self {
            loader,
            outcome: OnceLock::new(),
            loading: AtomicBool::new(false),
        }
    }

    /// Create a service around an already loaded bundle
    pub fn from_bundle(bundle: ArtifactBundle) -> Self {
        Self {
            loader: ArtifactLoader::default(),
            outcome: OnceLock::from(Ok(bundle)),
            loading: AtomicBool::new(false),
        }
    }

    /// Run the one-shot load if it has not happened yet
    pub fn initialize(&self) -> ServiceStatus {
        self.outcome();
        self.status()
    }

    pub fn status(&self) -> ServiceStatus {
        match self.outcome.get() {
            Some(Ok(bundle)) if bundle.schema().is_some() => ServiceStatus::Ready,
            Some(Ok(_)) => ServiceStatus::Degraded,
            Some(Err(_)) => ServiceStatus::Unavailable,
            None if self.loading.load(Ordering::Acquire) => ServiceStatus::Loading,
            None => ServiceStatus::Uninitialized,
        }
    }

    /// Loaded bundle, loading it first if needed
    pub fn bundle(&self) -> Option<&ArtifactBundle> {
        self.outcome().as_ref().ok()
    }

    /// Why loading failed, if it did
    pub fn load_failure(&self) -> Option<&LoadFailure> {
        self.outcome.get().and_then(|o| o.as_ref().err())
    }

    /// Feature schema of the loaded artifact
    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.bundle().and_then(ArtifactBundle::schema)
    }

    pub fn loader(&self) -> &ArtifactLoader {
        &self.loader
    }

    /// Classify one organism
    pub fn predict(&self, record: &OrganismRecord) -> Result<Prediction, InferenceError> {
        match self.outcome() {
            Ok(bundle) => PathogenicityPredictor::new(bundle).predict(record),
            Err(failure) => {
                error!("Model not loaded. Cannot make predictions.");
                Err(InferenceError::ModelUnavailable(failure.to_string()))
            }
        }
    }

    /// Rank candidates by similarity to `query`; empty when unavailable
    pub fn rank(
        &self,
        query: &OrganismRecord,
        candidates: &[OrganismRecord],
        top_n: usize,
    ) -> Vec<ScoredRecord> {
        match self.outcome() {
            Ok(bundle) => SimilarityRanker::new(bundle).rank(query, candidates, top_n),
            Err(_) => {
                warn!("Preprocessor not loaded; skipping similarity search");
                Vec::new()
            }
        }
    }

    fn outcome(&self) -> &LoadOutcome {
        self.load_once(|| self.loader.load())
    }

    fn load_once(&self, load: impl FnOnce() -> LoadOutcome) -> &LoadOutcome {
        self.outcome.get_or_init(|| {
            self.loading.store(true, Ordering::Release);
            let outcome = load();
            match &outcome {
                Ok(bundle) if bundle.schema().is_some() => info!("Inference service ready"),
                Ok(_) => warn!("Inference service degraded: artifact exposes no feature schema"),
                Err(failure) => error!("Inference service unavailable: {}", failure),
            }
            self.loading.store(false, Ordering::Release);
            outcome
        })
    }
}

impl fmt::Debug for InferenceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceService")
            .field("candidates", &self.loader.candidates())
            .field("status", &self.status())
            .finish()
    }
}
