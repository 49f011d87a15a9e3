//! Canonical parameter storage for fitted models.
//!
//! These types hold numbers only; id encoding lives in [`crate::encoding`] and the pairing
//! of encoder and parameters lives in [`crate::model`].

mod factors;
mod ffm;

pub use factors::LatentFactors;
pub use ffm::FieldAwareWeights;
