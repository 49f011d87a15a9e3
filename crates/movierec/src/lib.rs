//! movierec: a movie-rating recommendation pipeline.
//!
//! Turns raw `userId,movieId,rating` records into a trained, evaluated, persistable
//! predictor. Two model families are supported:
//!
//! - Matrix factorization over dense user/movie keys (rating regression)
//! - Field-aware factorization machines over hashed id tokens (binary relevance)
//!
//! # Key Types
//!
//! - [`DatasetSplitter`] - Deterministic train/test partitioning with optional binarization
//! - [`KeyEncoder`] / [`HashedTextEncoder`] - Frozen id encoders
//! - [`MatrixFactorizationTrainer`] / [`FieldAwareTrainer`] - [`Trainer`] implementations
//! - [`MatrixFactorizationModel`] / [`FieldAwareModel`] - Fitted [`Recommender`]s
//! - [`Metrics`] - Held-out evaluation results
//! - [`Model`] - Tagged model used at the persistence boundary (see [`io`])
//! - [`PipelineConfig`] / [`Pipeline`] - End-to-end orchestration
//!
//! # Example
//!
//! ```
//! use movierec::{MatrixFactorizationParams, MatrixFactorizationTrainer, RatingRecord};
//! use movierec::{Recommender, Trainer};
//!
//! let train = vec![
//!     RatingRecord::new(1, 10, 5.0),
//!     RatingRecord::new(1, 20, 1.0),
//!     RatingRecord::new(2, 10, 4.0),
//!     RatingRecord::new(2, 20, 2.0),
//! ];
//!
//! let params = MatrixFactorizationParams { rank: 1, iterations: 50, ..Default::default() };
//! let model = MatrixFactorizationTrainer::new(params).fit(&train).unwrap();
//!
//! let prediction = model.predict(&1, &10);
//! assert!(prediction.score > 3.0);
//! ```

pub mod catalog;
pub mod config;
pub mod data;
pub mod encoding;
pub mod error;
pub mod evaluation;
pub mod inference;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod repr;
pub mod testing;
pub mod training;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use catalog::{Movie, MovieCatalog};
pub use config::{Algorithm, ConfigError, PipelineConfig, Probe};
pub use data::{
    DatasetSplitter, InputSchema, LabeledRecord, ParseError, RatingRecord, RatingTable,
    RelevanceRecord, SplitSummary,
};
pub use encoding::{FeatureVector, HashedTextEncoder, KeyEncoder, UNKNOWN_KEY};
pub use error::{Error, Result};
pub use evaluation::{ClassificationMetrics, Metrics, RegressionMetrics};
pub use inference::{Prediction, RatingPrediction, RelevancePrediction, sigmoid_percent};
pub use model::{
    FieldAwareModel, MatrixFactorizationModel, Model, ModelMeta, Recommender, TaskKind,
};
pub use pipeline::{Pipeline, PipelineReport};
pub use training::{
    FieldAwareParams, FieldAwareTrainer, MatrixFactorizationParams, MatrixFactorizationTrainer,
    Trainer, TrainingError, Verbosity,
};
