//! Model fitting.
//!
//! ## Shared Infrastructure
//!
//! - [`Trainer`]: the capability the pipeline is polymorphic over
//! - [`TrainingError`]: invalid parameters, empty input, divergence
//! - [`TrainingLogger`], [`Verbosity`]: progress reporting
//!
//! ## Model-Specific Training
//!
//! - [`MatrixFactorizationTrainer`]: SGD over biased latent factors (rating regression)
//! - [`FieldAwareTrainer`]: AdaGrad over a field-aware factorization machine (relevance)
//!
//! Training is deterministic: the same rows in the same order with the same parameters and
//! seed produce a bit-identical model. Inputs are never mutated.

mod ffm;
mod logger;
mod mf;

use thiserror::Error;

pub use ffm::{FieldAwareParams, FieldAwareTrainer};
pub use logger::{TrainingLogger, Verbosity};
pub use mf::{MatrixFactorizationParams, MatrixFactorizationTrainer};

use crate::data::LabeledRecord;
use crate::model::Recommender;

/// Errors that can occur while fitting a model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    /// A hyperparameter is out of range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// No training rows were supplied.
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// The training loss became NaN or infinite.
    #[error("training diverged at iteration {iteration}")]
    Diverged { iteration: usize },
}

impl TrainingError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Fits a [`Recommender`] from labeled records.
pub trait Trainer {
    type Record: LabeledRecord;
    type Model: Recommender<Record = Self::Record>;

    /// Fit a model. `train` is read only.
    fn fit(&self, train: &[Self::Record]) -> Result<Self::Model, TrainingError>;
}

pub(crate) fn check_positive(name: &'static str, value: f32) -> Result<(), TrainingError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TrainingError::invalid(name, format!("must be positive and finite, got {value}")))
    }
}

pub(crate) fn check_non_negative(name: &'static str, value: f32) -> Result<(), TrainingError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TrainingError::invalid(name, format!("must be non-negative and finite, got {value}")))
    }
}

pub(crate) fn check_nonzero(name: &'static str, value: u32) -> Result<(), TrainingError> {
    if value == 0 {
        Err(TrainingError::invalid(name, "must be at least 1"))
    } else {
        Ok(())
    }
}
