//! Rating data: typed records, input schema, CSV loading, and train/test splitting.
//!
//! # Record Types
//!
//! - [`RatingRecord`]: numeric ids with a continuous 1-5 rating (regression)
//! - [`RelevanceRecord`]: string ids with a boolean relevance label (classification)
//!
//! Both implement [`LabeledRecord`], which is what trainers and evaluators consume.
//!
//! # Splitting
//!
//! [`DatasetSplitter`] works on a raw [`RatingTable`] (header + string fields) so that the
//! derived train/test files preserve the original field order and any extra columns.

mod error;
mod loader;
mod record;
mod schema;
pub mod split;

pub use error::ParseError;
pub use loader::{load_records, read_records};
pub use record::{LabeledRecord, RatingRecord, RelevanceRecord};
pub use schema::{Column, ColumnKind, InputSchema};
pub use split::{
    BINARIZE_THRESHOLD, DatasetSplitter, LabelKind, RatingTable, SplitSummary, binarize_rating,
};
