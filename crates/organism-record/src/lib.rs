//! Organism Records
//!
//! Provides the trait record exchanged between the persistence layer, the
//! caller, and the inference core.

mod error;
mod fields;
mod record;
mod scored;
mod value;

pub use error::RecordError;
pub use fields::{field_kind, FieldKind, KNOWN_FIELDS};
pub use record::OrganismRecord;
pub use scored::ScoredRecord;
pub use value::FieldValue;
