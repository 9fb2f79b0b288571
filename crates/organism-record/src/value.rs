//! Scalar field values

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single scalar trait value.
///
/// Deserialized untagged so plain JSON scalars map directly:
/// `true` is a [`FieldValue::Bool`], `37.5` a [`FieldValue::Number`] and
/// `"Rod"` a [`FieldValue::Text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the value, if it has one.
    ///
    /// Booleans map to 1/0 and text is parsed after trimming.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Short type name used in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "text",
        }
    }
}

/// Categorical rendering: booleans as `True`/`False`, numbers in their
/// shortest form, text verbatim.
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Bool(true) => f.write_str("True"),
            FieldValue::Bool(false) => f.write_str("False"),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_scalars() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[true, 37.5, "Rod"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Bool(true),
                FieldValue::Number(37.5),
                FieldValue::Text("Rod".into()),
            ]
        );
    }

    #[test]
    fn test_nested_values_rejected() {
        assert!(serde_json::from_str::<FieldValue>("[1, 2]").is_err());
        assert!(serde_json::from_str::<FieldValue>(r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(FieldValue::Bool(true).as_f64(), Some(1.0));
        assert_eq!(FieldValue::Text(" 30.5 ".into()).as_f64(), Some(30.5));
        assert_eq!(FieldValue::Text("warm".into()).as_f64(), None);
    }

    #[test]
    fn test_categorical_rendering() {
        assert_eq!(FieldValue::Bool(false).to_string(), "False");
        assert_eq!(FieldValue::Number(37.0).to_string(), "37");
        assert_eq!(FieldValue::Number(2.5).to_string(), "2.5");
        assert_eq!(FieldValue::Text("Rod".into()).to_string(), "Rod");
    }
}
