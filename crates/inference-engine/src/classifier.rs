//! Fitted classifiers

use ndarray::{aview1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised by a classifier
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("Invalid fitted classifier: {0}")]
    InvalidModel(String),

    #[error("Invalid input shape: expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Tree split on feature {feature} but input has {width} features")]
    FeatureOutOfRange { feature: usize, width: usize },

    #[error("Non-finite value in classifier {0}")]
    NonFinite(&'static str),
}

/// Fitted binary or multinomial classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression(LogisticRegression),
    GradientBoosting(GradientBoosting),
}

/// Linear model; one coefficient row for binary problems, one per class for
/// multinomial ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<i64>,
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

/// Boosted tree ensemble with a binary logistic objective
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    pub classes: Vec<i64>,
    /// Initial margin added to the summed leaf values
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

/// Flat node array; node 0 is the root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    /// Go to `yes` when `x[feature] < threshold`, `no` otherwise, and
    /// `missing` (default `yes`) when the value is NaN.
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
        #[serde(default)]
        missing: Option<usize>,
    },
    Leaf { value: f64 },
}

impl Classifier {
    /// Class labels in probability-column order
    pub fn classes(&self) -> &[i64] {
        match self {
            Classifier::LogisticRegression(m) => &m.classes,
            Classifier::GradientBoosting(m) => &m.classes,
        }
    }

    /// Fixed input width, if the model has one
    pub fn n_features_in(&self) -> Option<usize> {
        match self {
            Classifier::LogisticRegression(m) => m.coef.first().map(Vec::len),
            Classifier::GradientBoosting(_) => None,
        }
    }

    pub fn validate(&self) -> Result<(), ClassifierError> {
        let classes = self.classes();
        if classes.len() < 2 {
            return Err(ClassifierError::InvalidModel(format!(
                "expected at least 2 classes, got {}",
                classes.len()
            )));
        }
        if classes.iter().collect::<HashSet<_>>().len() != classes.len() {
            return Err(ClassifierError::InvalidModel("duplicate class labels".into()));
        }
        match self {
            Classifier::LogisticRegression(m) => m.validate(),
            Classifier::GradientBoosting(m) => m.validate(),
        }
    }

    /// Class probabilities, one row per input row and one column per class
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError> {
        let proba = match self {
            Classifier::LogisticRegression(m) => m.predict_proba(x)?,
            Classifier::GradientBoosting(m) => m.predict_proba(x)?,
        };
        if proba.iter().any(|p| !p.is_finite()) {
            return Err(ClassifierError::NonFinite("output"));
        }
        Ok(proba)
    }

    /// Most probable class per row; the first class wins ties
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<i64>, ClassifierError> {
        let proba = self.predict_proba(x)?;
        let classes = self.classes();
        Ok(proba
            .axis_iter(Axis(0))
            .map(|row| classes[argmax(row)])
            .collect())
    }
}

fn argmax(row: ArrayView1<'_, f64>) -> usize {
    let mut best = 0;
    for (i, p) in row.iter().enumerate() {
        if *p > row[best] {
            best = i;
        }
    }
    best
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticRegression {
    fn is_binary(&self) -> bool {
        self.classes.len() == 2 && self.coef.len() == 1
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        let rows = if self.is_binary() { 1 } else { self.classes.len() };
        if self.coef.len() != rows || self.intercept.len() != rows {
            return Err(ClassifierError::InvalidModel(format!(
                "expected {rows} coefficient rows and intercepts for {} classes, got {} and {}",
                self.classes.len(),
                self.coef.len(),
                self.intercept.len()
            )));
        }
        let width = self.coef[0].len();
        if self.coef.iter().any(|row| row.len() != width) {
            return Err(ClassifierError::InvalidModel("ragged coefficient rows".into()));
        }
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError> {
        let expected = self.coef.first().map_or(0, Vec::len);
        if x.ncols() != expected {
            return Err(ClassifierError::DimensionMismatch {
                expected,
                actual: x.ncols(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ClassifierError::NonFinite("input"));
        }

        let mut proba = Array2::<f64>::zeros((x.nrows(), self.classes.len()));
        for (row, mut out) in x.axis_iter(Axis(0)).zip(proba.axis_iter_mut(Axis(0))) {
            let margins: Vec<f64> = self
                .coef
                .iter()
                .zip(&self.intercept)
                .map(|(w, b)| row.dot(&aview1(w)) + b)
                .collect();

            if self.is_binary() {
                let p = sigmoid(margins[0]);
                out[0] = 1.0 - p;
                out[1] = p;
            } else {
                let max = margins.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let exp: Vec<f64> = margins.iter().map(|m| (m - max).exp()).collect();
                let total: f64 = exp.iter().sum();
                for (slot, e) in out.iter_mut().zip(exp) {
                    *slot = e / total;
                }
            }
        }
        Ok(proba)
    }
}

impl GradientBoosting {
    fn validate(&self) -> Result<(), ClassifierError> {
        if self.classes.len() != 2 {
            return Err(ClassifierError::InvalidModel(
                "gradient boosting supports binary classification only".into(),
            ));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|reason| ClassifierError::InvalidModel(format!("tree {t}: {reason}")))?;
        }
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ClassifierError> {
        let mut proba = Array2::<f64>::zeros((x.nrows(), 2));
        for (row, mut out) in x.axis_iter(Axis(0)).zip(proba.axis_iter_mut(Axis(0))) {
            let mut margin = self.base_score;
            for tree in &self.trees {
                margin += tree.leaf_value(row)?;
            }
            let p = sigmoid(margin);
            out[0] = 1.0 - p;
            out[1] = p;
        }
        Ok(proba)
    }
}

impl Tree {
    /// Children must point strictly forward so every walk terminates.
    fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { yes, no, missing, threshold, .. } = node {
                if !threshold.is_finite() {
                    return Err(format!("node {i} has a non-finite threshold"));
                }
                for child in [Some(*yes), Some(*no), *missing].into_iter().flatten() {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {i} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, x: ArrayView1<'_, f64>) -> Result<f64, ClassifierError> {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let value = *x.get(*feature).ok_or(ClassifierError::FeatureOutOfRange {
                        feature: *feature,
                        width: x.len(),
                    })?;
                    idx = if value.is_nan() {
                        missing.unwrap_or(*yes)
                    } else if value < *threshold {
                        *yes
                    } else {
                        *no
                    };
                }
            }
        }
    }
}
