//! Fitted models.
//!
//! Each model pairs the encoder it was trained with and its parameters, so predictions on
//! raw ids always go through the frozen training-time mapping.
//!
//! - [`MatrixFactorizationModel`]: rating regression
//! - [`FieldAwareModel`]: binary relevance
//! - [`Model`]: either of the two, as stored in and loaded from artifacts

mod ffm;
mod meta;
mod mf;

use std::path::Path;

pub use ffm::FieldAwareModel;
pub use meta::{ModelMeta, TaskKind};
pub use mf::MatrixFactorizationModel;

use crate::data::{InputSchema, LabeledRecord, ParseError, RatingRecord, RelevanceRecord};
use crate::evaluation::Metrics;
use crate::inference::Prediction;

/// Prediction and evaluation over raw ids.
///
/// Unknown ids never fail; they degrade through the encoder's unknown slot.
pub trait Recommender {
    /// Record type the model was trained on.
    type Record: LabeledRecord;
    /// Per-pair prediction.
    type Output: Into<Prediction> + Copy;

    fn predict(
        &self,
        user: &<Self::Record as LabeledRecord>::Id,
        movie: &<Self::Record as LabeledRecord>::Id,
    ) -> Self::Output;

    /// Score every record of a held-out set. Read only.
    fn evaluate(&self, test: &[Self::Record]) -> Metrics;

    fn meta(&self) -> &ModelMeta;

    /// Input columns the model expects.
    fn schema(&self) -> InputSchema {
        Self::Record::schema()
    }

    /// Wrap into the tagged [`Model`] used for persistence.
    fn into_model(self) -> Model
    where
        Self: Sized;
}

/// A fitted model of either family.
#[derive(Debug, Clone, PartialEq)]
pub enum Model {
    MatrixFactorization(MatrixFactorizationModel),
    FieldAware(FieldAwareModel),
}

impl Model {
    pub fn task(&self) -> TaskKind {
        self.meta().task
    }

    pub fn meta(&self) -> &ModelMeta {
        match self {
            Self::MatrixFactorization(m) => m.meta(),
            Self::FieldAware(m) => m.meta(),
        }
    }

    /// Input columns this model kind expects.
    pub fn schema(&self) -> InputSchema {
        match self {
            Self::MatrixFactorization(m) => m.schema(),
            Self::FieldAware(m) => m.schema(),
        }
    }

    /// Predict from textual ids without knowing the concrete model type.
    ///
    /// # Errors
    ///
    /// A matrix-factorization model needs numeric ids; text that does not parse as one is a
    /// [`ParseError`]. Well-formed but unseen ids are not an error.
    pub fn predict_raw(&self, user: &str, movie: &str) -> Result<Prediction, ParseError> {
        match self {
            Self::MatrixFactorization(m) => {
                let user = RatingRecord::parse_id(user, "userId")?;
                let movie = RatingRecord::parse_id(movie, "movieId")?;
                Ok(m.predict(&user, &movie).into())
            }
            Self::FieldAware(m) => {
                let user = RelevanceRecord::parse_id(user, "userId")?;
                let movie = RelevanceRecord::parse_id(movie, "movieId")?;
                Ok(m.predict(&user, &movie).into())
            }
        }
    }

    pub fn as_matrix_factorization(&self) -> Option<&MatrixFactorizationModel> {
        match self {
            Self::MatrixFactorization(m) => Some(m),
            Self::FieldAware(_) => None,
        }
    }

    pub fn as_field_aware(&self) -> Option<&FieldAwareModel> {
        match self {
            Self::FieldAware(m) => Some(m),
            Self::MatrixFactorization(_) => None,
        }
    }

    /// Save with the schema this model kind expects. See [`crate::io::save`].
    pub fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        crate::io::save(self, &self.schema(), path)
    }

    /// Load a model, discarding the embedded schema. See [`crate::io::load`].
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        crate::io::load(path).map(|(model, _)| model)
    }
}

impl From<MatrixFactorizationModel> for Model {
    fn from(m: MatrixFactorizationModel) -> Self {
        Self::MatrixFactorization(m)
    }
}

impl From<FieldAwareModel> for Model {
    fn from(m: FieldAwareModel) -> Self {
        Self::FieldAware(m)
    }
}
