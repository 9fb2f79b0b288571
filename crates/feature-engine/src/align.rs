//! Record alignment

use crate::FeatureSchema;
use organism_record::{FieldValue, OrganismRecord};
use tracing::debug;

/// One aligned value; `None` is the missing-value marker.
pub type Cell = Option<FieldValue>;

/// Tabular view of one or more records with a fixed column set.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl AlignedFrame {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[Cell]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at `(row, column)`, `None` when missing or out of range
    pub fn cell(&self, row: usize, column: &str) -> Option<&FieldValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_ref()
    }
}

/// Aligns records against an optional feature schema.
///
/// With a schema every frame has exactly the schema's columns in schema
/// order: absent fields become missing cells and extra fields are dropped.
/// Without one, records are passed through column-wise in their own field
/// order. Alignment never fails.
#[derive(Debug, Clone, Default)]
pub struct FeatureAligner {
    schema: Option<FeatureSchema>,
}

impl FeatureAligner {
    pub fn new(schema: Option<FeatureSchema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.schema.as_ref()
    }

    /// Align a single record into a one-row frame
    pub fn align(&self, record: &OrganismRecord) -> AlignedFrame {
        match &self.schema {
            Some(schema) => AlignedFrame {
                columns: schema.names().to_vec(),
                rows: vec![schema_row(schema, record)],
            },
            None => AlignedFrame {
                columns: record.field_names().map(str::to_string).collect(),
                rows: vec![record.iter().map(|(_, v)| v.cloned()).collect()],
            },
        }
    }

    /// Align a batch row-wise into a frame with one row per record.
    ///
    /// Without a schema the columns are the union of every record's fields
    /// in first-seen order.
    pub fn align_batch(&self, records: &[OrganismRecord]) -> AlignedFrame {
        match &self.schema {
            Some(schema) => AlignedFrame {
                columns: schema.names().to_vec(),
                rows: records.iter().map(|r| schema_row(schema, r)).collect(),
            },
            None => {
                let mut columns: Vec<String> = Vec::new();
                for name in records.iter().flat_map(OrganismRecord::field_names) {
                    if !columns.iter().any(|c| c == name) {
                        columns.push(name.to_string());
                    }
                }
                debug!(
                    "Aligning {} records without schema over {} columns",
                    records.len(),
                    columns.len()
                );
                let rows = records
                    .iter()
                    .map(|r| columns.iter().map(|c| r.get(c).cloned()).collect())
                    .collect();
                AlignedFrame { columns, rows }
            }
        }
    }
}

fn schema_row(schema: &FeatureSchema, record: &OrganismRecord) -> Vec<Cell> {
    schema
        .names()
        .iter()
        .map(|name| record.get(name).cloned())
        .collect()
}
