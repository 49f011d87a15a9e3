//! End-to-end run: split, train, evaluate, probe, save, reload.
//!
//! The run is polymorphic over [`Trainer`]; [`PipelineConfig::algorithm`] only selects which
//! trainer is handed to [`Pipeline::run_with`]. Whether ratings are binarized before the
//! split follows the trainer's record type.
//!
//! ```no_run
//! use movierec::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .ratings_path("ratings.csv")
//!     .seed(42)
//!     .build()
//!     .unwrap();
//! let report = Pipeline::new(config).run().unwrap();
//! println!("{}", report.metrics);
//! ```

use std::path::PathBuf;

use crate::config::{Algorithm, PipelineConfig, Probe};
use crate::data::{DatasetSplitter, LabeledRecord, SplitSummary, load_records};
use crate::evaluation::Metrics;
use crate::inference::Prediction;
use crate::io::DeserializeError;
use crate::model::{Model, Recommender};
use crate::training::{FieldAwareTrainer, MatrixFactorizationTrainer, Trainer};

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub algorithm: Algorithm,
    pub split: SplitSummary,
    /// Held-out evaluation of the fitted model.
    pub metrics: Metrics,
    pub probe: Probe,
    /// Probe prediction; identical before saving and after reloading.
    pub prediction: Prediction,
    pub model_path: PathBuf,
}

/// Orchestrates one run from a validated [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run with the trainer selected by the configured algorithm.
    pub fn run(&self) -> crate::Result<PipelineReport> {
        match self.config.algorithm {
            Algorithm::MatrixFactorization => self.run_with(&MatrixFactorizationTrainer::new(
                self.config.matrix_factorization_params(),
            )),
            Algorithm::FieldAware => {
                self.run_with(&FieldAwareTrainer::new(self.config.field_aware_params()))
            }
        }
    }

    /// Run with an explicit trainer.
    ///
    /// # Errors
    ///
    /// Configuration, parse, training, and I/O failures abort the run. A reloaded model
    /// whose probe prediction differs from the in-memory one is reported as a corrupt
    /// artifact.
    pub fn run_with<T: Trainer>(&self, trainer: &T) -> crate::Result<PipelineReport> {
        let config = &self.config;
        config.validate()?;
        tracing::info!(algorithm = %config.algorithm, seed = config.seed, "pipeline started");

        // ---- split ----
        let splitter = DatasetSplitter::new(config.split_fraction)?
            .with_binarize(<T::Record as LabeledRecord>::BINARY_LABEL);
        let split =
            splitter.split_file(&config.ratings_path, &config.train_path, &config.test_path)?;

        // ---- train ----
        let train: Vec<T::Record> = load_records(&config.train_path)?;
        let test: Vec<T::Record> = load_records(&config.test_path)?;
        let model = trainer.fit(&train)?;

        // ---- evaluate ----
        let metrics = model.evaluate(&test);
        tracing::info!(test_rows = test.len(), %metrics, "evaluated model");

        // ---- probe ----
        let probe = config.probe();
        let user = T::Record::parse_id(&probe.user, "userId")?;
        let movie = T::Record::parse_id(&probe.movie, "movieId")?;
        let prediction: Prediction = model.predict(&user, &movie).into();
        tracing::info!(
            user = %probe.user,
            movie = %probe.movie,
            score = prediction.score(),
            "probe prediction"
        );

        // ---- persist and verify ----
        let model = model.into_model();
        model.save(&config.model_path)?;
        let reloaded = Model::load(&config.model_path)?;
        let again = reloaded.predict_raw(&probe.user, &probe.movie)?;
        if again != prediction {
            return Err(DeserializeError::CorruptPayload(format!(
                "reloaded model predicts {again:?}, expected {prediction:?}"
            ))
            .into());
        }
        tracing::info!(path = %config.model_path.display(), "pipeline finished");

        Ok(PipelineReport {
            algorithm: config.algorithm,
            split,
            metrics,
            probe,
            prediction,
            model_path: config.model_path.clone(),
        })
    }
}
