//! Similarity-scored records

use crate::OrganismRecord;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

const SCORE_FIELD: &str = "similarity_score";

/// A copy of a candidate record with its similarity to a query attached.
///
/// Serializes flat: the record's fields followed by `similarity_score`. A
/// non-finite score is written as `null`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: OrganismRecord,
    pub similarity_score: f64,
}

impl ScoredRecord {
    pub fn new(record: OrganismRecord, similarity_score: f64) -> Self {
        Self {
            record,
            similarity_score,
        }
    }
}

impl Serialize for ScoredRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.record.iter().filter(|(n, _)| *n != SCORE_FIELD) {
            map.serialize_entry(name, &value)?;
        }
        let score = Some(self.similarity_score).filter(|s| s.is_finite());
        map.serialize_entry(SCORE_FIELD, &score)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_serialization() {
        let record = OrganismRecord::new().with("bacteria_id", "B1").with("shape", "Rod");
        let scored = ScoredRecord::new(record, 0.5);
        assert_eq!(
            serde_json::to_string(&scored).unwrap(),
            r#"{"bacteria_id":"B1","shape":"Rod","similarity_score":0.5}"#
        );
    }

    #[test]
    fn test_stale_score_replaced_and_nan_nulled() {
        let record = OrganismRecord::new()
            .with("similarity_score", 0.9)
            .with("shape", "Coccus");
        let scored = ScoredRecord::new(record, f64::NAN);
        assert_eq!(
            serde_json::to_string(&scored).unwrap(),
            r#"{"shape":"Coccus","similarity_score":null}"#
        );
    }
}
