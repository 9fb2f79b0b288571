//! Fitted preprocessing transforms

use crate::{AlignedFrame, Cell, FeatureError, FeatureSchema};
use ndarray::{s, Array2, ArrayViewMut2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fitted column transformer.
///
/// Each transformer reads its columns by name from an aligned frame and
/// writes a contiguous block of output features; blocks are concatenated in
/// transformer order. Columns not claimed by any transformer are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    /// Input feature names seen at fit time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names_in: Option<FeatureSchema>,
    pub transformers: Vec<ColumnTransform>,
}

/// One fitted transformer block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnTransform {
    Numeric(NumericTransform),
    Categorical(CategoricalTransform),
    /// Numeric columns copied as-is
    Passthrough { columns: Vec<String> },
}

/// Mean imputation followed by standard scaling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericTransform {
    pub columns: Vec<String>,
    /// Per-column fill for missing values; missing is an error without it
    #[serde(default)]
    pub fill: Option<Vec<f64>>,
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

/// Constant imputation followed by one-hot encoding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalTransform {
    pub columns: Vec<String>,
    #[serde(default)]
    pub fill: Option<String>,
    /// Fitted categories per column
    pub categories: Vec<Vec<String>>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

/// Behaviour on a category not seen at fit time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    /// Encode as all zeros
    Ignore,
}

impl Preprocessor {
    /// Schema recorded at fit time, if any
    pub fn feature_schema(&self) -> Option<&FeatureSchema> {
        self.feature_names_in.as_ref()
    }

    /// Width of the transformed feature vector
    pub fn n_features_out(&self) -> usize {
        self.transformers.iter().map(ColumnTransform::n_features_out).sum()
    }

    /// Check fitted parameters for internal consistency
    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.transformers.is_empty() {
            return Err(FeatureError::InvalidTransform("no transformers".into()));
        }
        for transform in &self.transformers {
            transform.validate()?;
            if let Some(schema) = &self.feature_names_in {
                if let Some(col) = transform.columns().iter().find(|c| !schema.contains(c)) {
                    return Err(FeatureError::InvalidTransform(format!(
                        "column {col} is not among the fitted input features"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Transform an aligned frame into one feature row per frame row
    pub fn transform(&self, frame: &AlignedFrame) -> Result<Array2<f64>, FeatureError> {
        let mut out = Array2::<f64>::zeros((frame.n_rows(), self.n_features_out()));
        let mut offset = 0;
        for transform in &self.transformers {
            let width = transform.n_features_out();
            transform.write(frame, out.slice_mut(s![.., offset..offset + width]))?;
            offset += width;
        }
        debug!(
            "Transformed {} rows x {} columns into {} features",
            frame.n_rows(),
            frame.n_columns(),
            offset
        );
        Ok(out)
    }
}

impl ColumnTransform {
    pub fn columns(&self) -> &[String] {
        match self {
            ColumnTransform::Numeric(t) => &t.columns,
            ColumnTransform::Categorical(t) => &t.columns,
            ColumnTransform::Passthrough { columns } => columns,
        }
    }

    pub fn n_features_out(&self) -> usize {
        match self {
            ColumnTransform::Numeric(t) => t.columns.len(),
            ColumnTransform::Categorical(t) => t.categories.iter().map(Vec::len).sum(),
            ColumnTransform::Passthrough { columns } => columns.len(),
        }
    }

    fn validate(&self) -> Result<(), FeatureError> {
        match self {
            ColumnTransform::Numeric(t) => t.validate(),
            ColumnTransform::Categorical(t) => t.validate(),
            ColumnTransform::Passthrough { .. } => Ok(()),
        }
    }

    fn write(&self, frame: &AlignedFrame, out: ArrayViewMut2<'_, f64>) -> Result<(), FeatureError> {
        match self {
            ColumnTransform::Numeric(t) => t.write(frame, out),
            ColumnTransform::Categorical(t) => t.write(frame, out),
            ColumnTransform::Passthrough { columns } => write_passthrough(columns, frame, out),
        }
    }
}

impl NumericTransform {
    fn validate(&self) -> Result<(), FeatureError> {
        let n = self.columns.len();
        for (label, params) in [("fill", &self.fill), ("mean", &self.mean), ("scale", &self.scale)] {
            if let Some(values) = params {
                if values.len() != n {
                    return Err(FeatureError::InvalidTransform(format!(
                        "numeric {label} has {} values for {n} columns",
                        values.len()
                    )));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(FeatureError::InvalidTransform(format!(
                        "numeric {label} contains a non-finite value"
                    )));
                }
            }
        }
        Ok(())
    }

    fn write(&self, frame: &AlignedFrame, mut out: ArrayViewMut2<'_, f64>) -> Result<(), FeatureError> {
        for (j, column) in self.columns.iter().enumerate() {
            let idx = column_index(frame, column)?;
            let fill = self.fill.as_ref().map(|f| f[j]);
            let mean = self.mean.as_ref().map_or(0.0, |m| m[j]);
            let scale = self
                .scale
                .as_ref()
                .map(|s| s[j])
                .filter(|s| *s != 0.0)
                .unwrap_or(1.0);

            for (row, cells) in frame.rows().iter().enumerate() {
                let value = match numeric_cell(&cells[idx], column, row)? {
                    Some(v) => v,
                    None => fill.ok_or_else(|| FeatureError::MissingValue {
                        column: column.clone(),
                        row,
                    })?,
                };
                let scaled = (value - mean) / scale;
                if !scaled.is_finite() {
                    return Err(FeatureError::NonFinite {
                        column: column.clone(),
                        row,
                    });
                }
                out[[row, j]] = scaled;
            }
        }
        Ok(())
    }
}

impl CategoricalTransform {
    fn validate(&self) -> Result<(), FeatureError> {
        if self.categories.len() != self.columns.len() {
            return Err(FeatureError::InvalidTransform(format!(
                "categorical has {} category lists for {} columns",
                self.categories.len(),
                self.columns.len()
            )));
        }
        Ok(())
    }

    fn write(&self, frame: &AlignedFrame, mut out: ArrayViewMut2<'_, f64>) -> Result<(), FeatureError> {
        let mut offset = 0;
        for (column, categories) in self.columns.iter().zip(&self.categories) {
            let idx = column_index(frame, column)?;
            for (row, cells) in frame.rows().iter().enumerate() {
                let value = match &cells[idx] {
                    Some(v) => v.to_string(),
                    None => self.fill.clone().ok_or_else(|| FeatureError::MissingValue {
                        column: column.clone(),
                        row,
                    })?,
                };
                match categories.iter().position(|c| *c == value) {
                    Some(pos) => out[[row, offset + pos]] = 1.0,
                    None if self.handle_unknown == HandleUnknown::Ignore => {}
                    None => {
                        return Err(FeatureError::UnknownCategory {
                            column: column.clone(),
                            value,
                        })
                    }
                }
            }
            offset += categories.len();
        }
        Ok(())
    }
}

fn write_passthrough(
    columns: &[String],
    frame: &AlignedFrame,
    mut out: ArrayViewMut2<'_, f64>,
) -> Result<(), FeatureError> {
    for (j, column) in columns.iter().enumerate() {
        let idx = column_index(frame, column)?;
        for (row, cells) in frame.rows().iter().enumerate() {
            out[[row, j]] = numeric_cell(&cells[idx], column, row)?.ok_or_else(|| {
                FeatureError::MissingValue {
                    column: column.clone(),
                    row,
                }
            })?;
        }
    }
    Ok(())
}

fn column_index(frame: &AlignedFrame, column: &str) -> Result<usize, FeatureError> {
    frame
        .column_index(column)
        .ok_or_else(|| FeatureError::MissingColumn(column.to_string()))
}

/// Numeric value of a cell; only an absent cell counts as missing.
fn numeric_cell(cell: &Cell, column: &str, row: usize) -> Result<Option<f64>, FeatureError> {
    match cell {
        None => Ok(None),
        Some(value) => match value.as_f64() {
            Some(v) if !v.is_finite() => Err(FeatureError::NonFinite {
                column: column.to_string(),
                row,
            }),
            Some(v) => Ok(Some(v)),
            None => Err(FeatureError::TypeMismatch {
                column: column.to_string(),
                row,
                found: value.type_name(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FeatureAligner;
    use organism_record::OrganismRecord;

    fn preprocessor(handle_unknown: HandleUnknown) -> Preprocessor {
        Preprocessor {
            feature_names_in: Some(
                FeatureSchema::new(["gram_stain", "shape", "optimal_temperature"]).unwrap(),
            ),
            transformers: vec![
                ColumnTransform::Numeric(NumericTransform {
                    columns: vec!["optimal_temperature".into()],
                    fill: Some(vec![30.0]),
                    mean: Some(vec![30.0]),
                    scale: Some(vec![5.0]),
                }),
                ColumnTransform::Categorical(CategoricalTransform {
                    columns: vec!["gram_stain".into(), "shape".into()],
                    fill: Some("missing".into()),
                    categories: vec![
                        vec!["Negative".into(), "Positive".into()],
                        vec!["Coccus".into(), "Rod".into(), "missing".into()],
                    ],
                    handle_unknown,
                }),
            ],
        }
    }

    fn align(p: &Preprocessor, record: &OrganismRecord) -> AlignedFrame {
        FeatureAligner::new(p.feature_schema().cloned()).align(record)
    }

    #[test]
    fn test_transform_scales_and_encodes() {
        let p = preprocessor(HandleUnknown::Error);
        p.validate().unwrap();
        assert_eq!(p.n_features_out(), 6);

        let record = OrganismRecord::new()
            .with("gram_stain", "Positive")
            .with("shape", "Rod")
            .with("optimal_temperature", 40.0);
        let x = p.transform(&align(&p, &record)).unwrap();

        assert_eq!(x.shape(), &[1, 6]);
        assert_eq!(x.row(0).to_vec(), vec![2.0, 0.0, 1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_values_use_fill() {
        let p = preprocessor(HandleUnknown::Error);
        let record = OrganismRecord::new().with("gram_stain", "Negative");
        let x = p.transform(&align(&p, &record)).unwrap();

        // temperature imputed at the mean, shape imputed as "missing"
        assert_eq!(x.row(0).to_vec(), vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_category_handling() {
        let record = OrganismRecord::new()
            .with("gram_stain", "Positive")
            .with("shape", "Spiral");

        let strict = preprocessor(HandleUnknown::Error);
        let err = strict.transform(&align(&strict, &record)).unwrap_err();
        assert_eq!(
            err,
            FeatureError::UnknownCategory {
                column: "shape".into(),
                value: "Spiral".into()
            }
        );

        let lenient = preprocessor(HandleUnknown::Ignore);
        let x = lenient.transform(&align(&lenient, &record)).unwrap();
        assert_eq!(x.row(0).slice(s![3..6]).to_vec(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let p = preprocessor(HandleUnknown::Error);
        let record = OrganismRecord::new().with("optimal_temperature", "warm");
        let err = p.transform(&align(&p, &record)).unwrap_err();
        assert!(matches!(err, FeatureError::TypeMismatch { found: "text", .. }));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let p = preprocessor(HandleUnknown::Error);
        for raw in ["inf", "-Infinity", "nan"] {
            let record = OrganismRecord::new().with("optimal_temperature", raw);
            let err = p.transform(&align(&p, &record)).unwrap_err();
            assert_eq!(
                err,
                FeatureError::NonFinite {
                    column: "optimal_temperature".into(),
                    row: 0
                }
            );
        }

        let record = OrganismRecord::new().with("optimal_temperature", f64::NAN);
        assert!(matches!(
            p.transform(&align(&p, &record)),
            Err(FeatureError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_overflowing_scale_rejected() {
        let p = preprocessor(HandleUnknown::Error);
        let record = OrganismRecord::new().with("optimal_temperature", f64::MAX);
        let mut tiny = p.clone();
        if let ColumnTransform::Numeric(t) = &mut tiny.transformers[0] {
            t.mean = Some(vec![-f64::MAX]);
        }
        let err = tiny.transform(&align(&tiny, &record)).unwrap_err();
        assert!(matches!(err, FeatureError::NonFinite { row: 0, .. }));
    }

    #[test]
    fn test_unaligned_frame_missing_column() {
        let p = preprocessor(HandleUnknown::Error);
        let frame = FeatureAligner::new(None).align(&OrganismRecord::new().with("shape", "Rod"));
        let err = p.transform(&frame).unwrap_err();
        assert_eq!(err, FeatureError::MissingColumn("optimal_temperature".into()));
    }

    #[test]
    fn test_passthrough_requires_value() {
        let p = Preprocessor {
            feature_names_in: None,
            transformers: vec![ColumnTransform::Passthrough {
                columns: vec!["optimal_temperature".into()],
            }],
        };
        let frame = FeatureAligner::new(None)
            .align(&OrganismRecord::new().with_null("optimal_temperature"));
        assert!(matches!(
            p.transform(&frame).unwrap_err(),
            FeatureError::MissingValue { row: 0, .. }
        ));
    }

    #[test]
    fn test_validate_catches_inconsistencies() {
        let mut p = preprocessor(HandleUnknown::Error);
        if let ColumnTransform::Numeric(t) = &mut p.transformers[0] {
            t.mean = Some(vec![1.0, 2.0]);
        }
        assert!(matches!(p.validate(), Err(FeatureError::InvalidTransform(_))));

        let mut p = preprocessor(HandleUnknown::Error);
        p.feature_names_in = Some(FeatureSchema::new(["gram_stain", "shape"]).unwrap());
        assert!(matches!(p.validate(), Err(FeatureError::InvalidTransform(_))));
    }

    #[test]
    fn test_decode_from_json() {
        let json = r#"{
            "feature_names_in": ["gram_stain", "optimal_temperature"],
            "transformers": [
                {"kind": "numeric", "columns": ["optimal_temperature"], "fill": [37.0]},
                {"kind": "categorical", "columns": ["gram_stain"],
                 "categories": [["Negative", "Positive"]], "handle_unknown": "ignore"}
            ]
        }"#;
        let p: Preprocessor = serde_json::from_str(json).unwrap();
        p.validate().unwrap();
        assert_eq!(p.n_features_out(), 3);
        assert_eq!(p.feature_schema().map(FeatureSchema::len), Some(2));
    }
}
