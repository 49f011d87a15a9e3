//! Id encoders fitted on training data and frozen inside fitted models.
//!
//! - [`KeyEncoder`]: dense integer keys for matrix factorization
//! - [`HashedTextEncoder`]: hashed token features for field-aware factorization machines
//!
//! Both are deterministic functions of the training ids, and both map ids never seen during
//! fitting to a reserved slot rather than failing.

mod hashed;
mod keys;

pub use hashed::{
    DEFAULT_BUCKETS, Feature, FeatureVector, HashedTextEncoder, MOVIE_FIELD, N_FIELDS, USER_FIELD,
};
pub use keys::{KeyEncoder, UNKNOWN_KEY};
