//! Artifact shapes and the decoded bundle

use crate::Classifier;
use feature_engine::{FeatureAligner, FeatureSchema, Preprocessor};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const PREPROCESSOR_STEP: &str = "preprocessor";
const CLASSIFIER_STEP: &str = "classifier";

/// Which accepted shape an artifact was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    NamedSteps,
    StepsList,
    BarePair,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShapeKind::NamedSteps => "named_steps",
            ShapeKind::StepsList => "steps",
            ShapeKind::BarePair => "pair",
        })
    }
}

/// One accepted artifact layout, holding its undecoded stages.
///
/// - `{"named_steps": {"preprocessor": .., "classifier": ..}}`
/// - `{"steps": [["preprocessor", ..], ["classifier", ..]]}`
/// - `[preprocessor, classifier]`
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactShape {
    NamedSteps(Map<String, Value>),
    StepsList(Vec<(String, Value)>),
    BarePair(Value, Value),
}

impl ArtifactShape {
    /// Every shape present in a parsed document, in order of preference.
    ///
    /// A pipeline object may carry both `named_steps` and `steps`; both are
    /// returned so the second can be searched when the first is incomplete.
    pub fn detect(document: Value) -> Vec<ArtifactShape> {
        match document {
            Value::Object(mut pipeline) => {
                let mut shapes = Vec::with_capacity(2);
                if let Some(Value::Object(named)) = pipeline.remove("named_steps") {
                    shapes.push(ArtifactShape::NamedSteps(named));
                }
                if let Some(steps) = pipeline.remove("steps") {
                    match Vec::<(String, Value)>::deserialize(&steps) {
                        Ok(steps) => shapes.push(ArtifactShape::StepsList(steps)),
                        Err(e) => warn!("Ignoring malformed pipeline steps: {}", e),
                    }
                }
                shapes
            }
            Value::Array(items) if items.len() == 2 => {
                let mut items = items.into_iter();
                match (items.next(), items.next()) {
                    (Some(first), Some(second)) => vec![ArtifactShape::BarePair(first, second)],
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            ArtifactShape::NamedSteps(_) => ShapeKind::NamedSteps,
            ArtifactShape::StepsList(_) => ShapeKind::StepsList,
            ArtifactShape::BarePair(..) => ShapeKind::BarePair,
        }
    }

    /// Decode this shape's stages; `None` when either stage is absent, null,
    /// or does not decode as its component.
    pub fn decode(&self) -> Option<(Preprocessor, Classifier)> {
        let (preprocessor, classifier) = match self {
            ArtifactShape::NamedSteps(steps) => (
                steps.get(PREPROCESSOR_STEP).and_then(decode_preprocessor),
                steps.get(CLASSIFIER_STEP).and_then(decode_classifier),
            ),
            ArtifactShape::StepsList(steps) => (
                find_step(steps, PREPROCESSOR_STEP).and_then(decode_preprocessor),
                find_step(steps, CLASSIFIER_STEP).and_then(decode_classifier),
            ),
            ArtifactShape::BarePair(first, second) => {
                (decode_preprocessor(first), decode_classifier(second))
            }
        };
        debug!(
            "Shape {}: preprocessor={}, classifier={}",
            self.kind(),
            preprocessor.is_some(),
            classifier.is_some()
        );
        Some((preprocessor?, classifier?))
    }
}

fn find_step<'a>(steps: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
    steps.iter().find(|(n, _)| n == name).map(|(_, stage)| stage)
}

fn decode_preprocessor(stage: &Value) -> Option<Preprocessor> {
    if stage.is_null() {
        return None;
    }
    let preprocessor = Preprocessor::deserialize(stage)
        .map_err(|e| warn!("Preprocessor stage does not decode: {}", e))
        .ok()?;
    preprocessor
        .validate()
        .map_err(|e| warn!("Preprocessor stage is inconsistent: {}", e))
        .ok()?;
    Some(preprocessor)
}

fn decode_classifier(stage: &Value) -> Option<Classifier> {
    if stage.is_null() {
        return None;
    }
    let classifier = Classifier::deserialize(stage)
        .map_err(|e| warn!("Classifier stage does not decode: {}", e))
        .ok()?;
    classifier
        .validate()
        .map_err(|e| warn!("Classifier stage is inconsistent: {}", e))
        .ok()?;
    Some(classifier)
}

/// Loaded preprocessor and classifier, plus the aligner built from the
/// preprocessor's fitted schema. Read-only once built.
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    preprocessor: Preprocessor,
    classifier: Classifier,
    aligner: FeatureAligner,
    shape: Option<ShapeKind>,
    source: Option<PathBuf>,
}

impl ArtifactBundle {
    pub fn new(preprocessor: Preprocessor, classifier: Classifier) -> Self {
        let aligner = FeatureAligner::new(preprocessor.feature_schema().cloned());
        if let Some(expected) = classifier.n_features_in() {
            let produced = preprocessor.n_features_out();
            if expected != produced {
                warn!(
                    "Classifier expects {} features but preprocessor produces {}",
                    expected, produced
                );
            }
        }
        Self {
            preprocessor,
            classifier,
            aligner,
            shape: None,
            source: None,
        }
    }

    /// Decode a parsed artifact document, trying each detected shape in
    /// order until one yields both stages.
    pub fn from_document(document: Value) -> Option<Self> {
        ArtifactShape::detect(document).into_iter().find_map(|shape| {
            let kind = shape.kind();
            shape.decode().map(|(preprocessor, classifier)| {
                let mut bundle = Self::new(preprocessor, classifier);
                bundle.shape = Some(kind);
                bundle
            })
        })
    }

    pub(crate) fn with_source(mut self, path: &Path) -> Self {
        self.source = Some(path.to_path_buf());
        self
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn aligner(&self) -> &FeatureAligner {
        &self.aligner
    }

    /// Fitted feature schema; `None` means alignment falls back to
    /// passing records through unmodified.
    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.aligner.schema()
    }

    pub fn shape(&self) -> Option<ShapeKind> {
        self.shape
    }

    /// File the bundle was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
