//! Pathogenicity Predictor

use crate::{ArtifactBundle, InferenceError};
use ndarray::ArrayView1;
use organism_record::OrganismRecord;
use serde::Serialize;
use tracing::{debug, error};

/// Binary pathogenicity call
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted class label
    pub label: i64,
    /// Probability mass on the pathogen class (0.0 to 1.0)
    pub probability: f64,
}

impl Prediction {
    pub fn is_pathogen(&self) -> bool {
        self.label == 1
    }
}

/// Runs one record through preprocessor and classifier
#[derive(Debug, Clone, Copy)]
pub struct PathogenicityPredictor<'a> {
    bundle: &'a ArtifactBundle,
}

impl<'a> PathogenicityPredictor<'a> {
    pub fn new(bundle: &'a ArtifactBundle) -> Self {
        Self { bundle }
    }

    pub fn predict(&self, record: &OrganismRecord) -> Result<Prediction, InferenceError> {
        let frame = self.bundle.aligner().align(record);
        let x = self.bundle.preprocessor().transform(&frame).map_err(|source| {
            error!("Error preprocessing {}: {} (input: {:?})", record.identity(), source, record);
            InferenceError::FeaturePreparation {
                record: Box::new(record.clone()),
                source,
            }
        })?;

        let classifier = self.bundle.classifier();
        let (labels, proba) = classifier
            .predict(x.view())
            .and_then(|labels| Ok((labels, classifier.predict_proba(x.view())?)))
            .map_err(|e| {
                error!("Error during prediction for {}: {}", record.identity(), e);
                InferenceError::from(e)
            })?;

        let prediction = Prediction {
            label: labels[0],
            probability: pathogen_probability(classifier.classes(), proba.row(0)),
        };
        debug!(
            "Predicted {} for {} (p={:.3})",
            prediction.label,
            record.identity(),
            prediction.probability
        );
        Ok(prediction)
    }
}

/// Probability reported for the pathogen class.
///
/// Class order in the fitted classifier is not guaranteed, so index 1 is only
/// used when the classifier reports label `1` there; otherwise index 0 is
/// reported.
fn pathogen_probability(classes: &[i64], proba: ArrayView1<'_, f64>) -> f64 {
    if proba.len() > 1 && classes.get(1) == Some(&1) {
        proba[1]
    } else {
        proba[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fixtures, ClassifierError, LogisticRegression, Classifier};
    use feature_engine::FeatureError;
    use ndarray::array;

    #[test]
    fn test_predict_partial_record() {
        let bundle = fixtures::bundle();
        let predictor = PathogenicityPredictor::new(&bundle);
        let query = OrganismRecord::new()
            .with("gram_stain", "Positive")
            .with("shape", "Rod");

        let frame = bundle.aligner().align(&query);
        assert_eq!(frame.n_columns(), 3);
        assert_eq!(frame.cell(0, "optimal_temperature"), None);

        let prediction = predictor.predict(&query).unwrap();
        assert!(prediction.label == 0 || prediction.label == 1);
        assert!((0.0..=1.0).contains(&prediction.probability));
    }

    #[test]
    fn test_predict_is_deterministic() {
        let bundle = fixtures::bundle();
        let predictor = PathogenicityPredictor::new(&bundle);
        let query = fixtures::organism("B7", "Negative", "Coccus", 41.0);

        let first = predictor.predict(&query).unwrap();
        for _ in 0..10 {
            assert_eq!(predictor.predict(&query).unwrap(), first);
        }
    }

    #[test]
    fn test_label_agrees_with_probability() {
        let bundle = fixtures::bundle();
        let predictor = PathogenicityPredictor::new(&bundle);

        let pathogen = predictor
            .predict(&fixtures::organism("P", "Positive", "Rod", 45.0))
            .unwrap();
        assert!(pathogen.is_pathogen());
        assert!(pathogen.probability > 0.5);

        let benign = predictor
            .predict(&fixtures::organism("N", "Negative", "Coccus", 20.0))
            .unwrap();
        assert!(!benign.is_pathogen());
        assert!(benign.probability < 0.5);
    }

    #[test]
    fn test_feature_preparation_error_carries_record() {
        let bundle = fixtures::bundle();
        let query = OrganismRecord::new()
            .with("bacteria_id", "BAD1")
            .with("optimal_temperature", "hot");

        let err = PathogenicityPredictor::new(&bundle).predict(&query).unwrap_err();
        match err {
            InferenceError::FeaturePreparation { record, source } => {
                assert_eq!(*record, query);
                assert!(matches!(source, FeatureError::TypeMismatch { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_input_is_feature_preparation_error() {
        let bundle = fixtures::bundle();
        let predictor = PathogenicityPredictor::new(&bundle);

        for raw in ["inf", "nan"] {
            let query = OrganismRecord::new()
                .with("gram_stain", "Positive")
                .with("shape", "Rod")
                .with("optimal_temperature", raw);
            match predictor.predict(&query).unwrap_err() {
                InferenceError::FeaturePreparation { source, .. } => {
                    assert!(matches!(source, FeatureError::NonFinite { .. }), "{raw}: {source}")
                }
                other => panic!("{raw}: unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_classifier_failure_is_prediction_error() {
        let bundle = crate::ArtifactBundle::new(
            fixtures::bundle().preprocessor().clone(),
            Classifier::LogisticRegression(LogisticRegression {
                classes: vec![0, 1],
                coef: vec![vec![1.0, 1.0]],
                intercept: vec![0.0],
            }),
        );
        let err = PathogenicityPredictor::new(&bundle)
            .predict(&fixtures::organism("X", "Positive", "Rod", 30.0))
            .unwrap_err();
        assert!(matches!(
            err,
            InferenceError::Prediction(ClassifierError::DimensionMismatch { expected: 2, actual: 5 })
        ));
    }

    // The index rule encodes an assumption about how the training artifact
    // orders its classes, not a property of the organisms themselves.
    #[test]
    fn test_probability_index_assumes_pathogen_label_one() {
        let proba = array![0.2, 0.8];
        assert_eq!(pathogen_probability(&[0, 1], proba.view()), 0.8);
        // classes stored the other way round: index 0 is reported as-is
        assert_eq!(pathogen_probability(&[1, 0], proba.view()), 0.2);
        // unexpected labels also fall back to index 0
        assert_eq!(pathogen_probability(&[-1, 2], proba.view()), 0.2);
        assert_eq!(pathogen_probability(&[1], array![0.7].view()), 0.7);
    }
}
