//! Feature Engineering Engine
//!
//! Aligns organism records to the feature schema a fitted preprocessor
//! expects, and applies that preprocessor to produce numeric feature vectors.

mod align;
mod error;
mod schema;
mod transform;

pub use align::{AlignedFrame, Cell, FeatureAligner};
pub use error::FeatureError;
pub use schema::FeatureSchema;
pub use transform::{
    CategoricalTransform, ColumnTransform, HandleUnknown, NumericTransform, Preprocessor,
};
