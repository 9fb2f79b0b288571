//! Ordered organism record

use crate::{FieldValue, RecordError};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Mapping from field name to optional scalar value.
///
/// Field order is the order in which fields were first set, which is also the
/// column order used when a record is aligned without a known schema. A field
/// set to `None` is present but null; [`OrganismRecord::get`] treats it the
/// same as an absent field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganismRecord {
    fields: Vec<(String, Option<FieldValue>)>,
}

impl OrganismRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with room for `capacity` fields
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Builder-style setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, Some(value.into()));
        self
    }

    /// Builder-style setter for an explicit null
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.set(name, None);
        self
    }

    /// Set a field, keeping its original position if it already exists
    pub fn set(&mut self, name: impl Into<String>, value: Option<FieldValue>) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Non-null value of a field
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Whether the field is present, null or not
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    /// Fields in record order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FieldValue>)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_ref()))
    }

    /// Field names in record order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Human-readable identity for diagnostics: `bacteria_id`, then `name`,
    /// then `<anonymous>`.
    pub fn identity(&self) -> String {
        ["bacteria_id", "name"]
            .iter()
            .find_map(|key| self.get(key))
            .map(|v| v.to_string())
            .unwrap_or_else(|| "<anonymous>".to_string())
    }

    /// Parse a record from a JSON object
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, RecordError> {
        if !value.is_object() {
            return Err(RecordError::UnexpectedShape {
                expected: "object",
                actual: json_kind(&value),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a JSON document holding either one record or an array of records
    pub fn many_from_json_str(input: &str) -> Result<Vec<Self>, RecordError> {
        match serde_json::from_str::<serde_json::Value>(input)? {
            serde_json::Value::Array(items) => {
                items.into_iter().map(Self::from_json_value).collect()
            }
            other => Ok(vec![Self::from_json_value(other)?]),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl Serialize for OrganismRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrganismRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = OrganismRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of scalar organism fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut record = OrganismRecord::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, value)) = map.next_entry::<String, Option<FieldValue>>()? {
                    record.set(name, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}
