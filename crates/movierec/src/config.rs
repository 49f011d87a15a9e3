//! Pipeline configuration with builder pattern.
//!
//! [`PipelineConfig`] gathers everything a pipeline run needs: file locations, the model
//! family, hyperparameter overrides, the split fraction and the random seed. It is built
//! through a `bon` builder that validates on `build()`, or deserialized from JSON.
//!
//! # Example
//!
//! ```
//! use movierec::{Algorithm, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .ratings_path("ratings.csv")
//!     .seed(7)
//!     .algorithm(Algorithm::FieldAware)
//!     .iterations(10)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.field_aware_params().iterations, 10);
//! let bad = PipelineConfig::builder().ratings_path("r.csv").seed(1).split_fraction(1.0).build();
//! assert!(bad.is_err());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::training::{FieldAwareParams, MatrixFactorizationParams, Verbosity};

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Train fraction must be in (0, 1).
    InvalidSplitFraction(f64),
    /// Learning rate must be positive and finite.
    InvalidLearningRate(f32),
    /// Latent rank must be at least 1.
    InvalidRank,
    /// Number of iterations must be at least 1.
    InvalidIterations,
    /// A required path is empty.
    MissingPath(&'static str),
    /// The configuration file could not be parsed.
    Malformed(String),
    /// Unknown algorithm name.
    UnknownAlgorithm(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSplitFraction(v) => {
                write!(f, "split_fraction must be in (0, 1), got {}", v)
            }
            Self::InvalidLearningRate(v) => {
                write!(f, "learning_rate must be positive, got {}", v)
            }
            Self::InvalidRank => write!(f, "rank must be at least 1"),
            Self::InvalidIterations => write!(f, "iterations must be at least 1"),
            Self::MissingPath(field) => write!(f, "{} must not be empty", field),
            Self::Malformed(msg) => write!(f, "malformed configuration: {}", msg),
            Self::UnknownAlgorithm(name) => write!(
                f,
                "unknown algorithm {:?} (expected matrix_factorization or field_aware)",
                name
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

// =============================================================================
// Algorithm
// =============================================================================

/// Model family trained by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Rating regression with latent factors.
    #[default]
    MatrixFactorization,
    /// Binary relevance with a field-aware factorization machine.
    FieldAware,
}

impl Algorithm {
    /// Probe pair scored after training when none is configured.
    pub fn default_probe(self) -> Probe {
        match self {
            Self::MatrixFactorization => Probe::new("191", "20"),
            Self::FieldAware => Probe::new("6", "15"),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MatrixFactorization => "matrix_factorization",
            Self::FieldAware => "field_aware",
        })
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "matrix_factorization" | "mf" => Ok(Self::MatrixFactorization),
            "field_aware" | "ffm" => Ok(Self::FieldAware),
            _ => Err(ConfigError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// A `(user, movie)` pair scored at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Probe {
    pub user: String,
    pub movie: String,
}

impl Probe {
    pub fn new(user: impl Into<String>, movie: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            movie: movie.into(),
        }
    }
}

// =============================================================================
// PipelineConfig
// =============================================================================

fn default_train_path() -> PathBuf {
    PathBuf::from("ratings-train.csv")
}

fn default_test_path() -> PathBuf {
    PathBuf::from("ratings-test.csv")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model.mrec")
}

fn default_split_fraction() -> f64 {
    0.9
}

fn default_verbosity() -> Verbosity {
    Verbosity::Info
}

/// Configuration for a full split/train/evaluate/save run.
///
/// Hyperparameters left unset fall back to the chosen algorithm's defaults
/// (see [`MatrixFactorizationParams`] and [`FieldAwareParams`]).
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
pub struct PipelineConfig {
    // === Files ===
    /// Raw `userId,movieId,rating,timestamp` CSV.
    #[builder(into)]
    pub ratings_path: PathBuf,

    /// Destination of the derived training split.
    #[builder(into, default = default_train_path())]
    #[serde(default = "default_train_path")]
    pub train_path: PathBuf,

    /// Destination of the derived test split.
    #[builder(into, default = default_test_path())]
    #[serde(default = "default_test_path")]
    pub test_path: PathBuf,

    /// Destination of the saved model artifact.
    #[builder(into, default = default_model_path())]
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    // === Model ===
    #[builder(default)]
    #[serde(default)]
    pub algorithm: Algorithm,

    /// Latent dimension override.
    #[serde(default)]
    pub rank: Option<u32>,

    /// Training epochs override.
    #[serde(default)]
    pub iterations: Option<u32>,

    /// Step size override.
    #[serde(default)]
    pub learning_rate: Option<f32>,

    // === Data ===
    /// Fraction of rows (earliest first) used for training. Default: 0.9.
    #[builder(default = default_split_fraction())]
    #[serde(default = "default_split_fraction")]
    pub split_fraction: f64,

    // === Reproducibility ===
    /// Random seed for factor initialization and visiting order. Required.
    pub seed: u64,

    // === Logging ===
    /// Training verbosity. Default: `Info`.
    #[builder(default = default_verbosity())]
    #[serde(default = "default_verbosity")]
    pub verbosity: Verbosity,

    /// Pair scored after training. Defaults to the algorithm's probe.
    #[serde(default)]
    pub probe: Option<Probe>,
}

/// Custom finishing function that validates the config.
impl<S: pipeline_config_builder::IsComplete> PipelineConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any parameter is invalid:
    /// - `split_fraction` outside (0, 1)
    /// - `rank == 0` or `iterations == 0`
    /// - non-positive or non-finite `learning_rate`
    /// - empty `ratings_path`
    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl PipelineConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&text)?)
    }

    /// Parse and validate a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ratings_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath("ratings_path"));
        }

        if !(self.split_fraction > 0.0 && self.split_fraction < 1.0) {
            return Err(ConfigError::InvalidSplitFraction(self.split_fraction));
        }

        if self.rank == Some(0) {
            return Err(ConfigError::InvalidRank);
        }

        if self.iterations == Some(0) {
            return Err(ConfigError::InvalidIterations);
        }

        if let Some(lr) = self.learning_rate {
            if !(lr.is_finite() && lr > 0.0) {
                return Err(ConfigError::InvalidLearningRate(lr));
            }
        }

        Ok(())
    }

    /// The configured probe, or the algorithm's default.
    pub fn probe(&self) -> Probe {
        self.probe
            .clone()
            .unwrap_or_else(|| self.algorithm.default_probe())
    }

    /// Matrix-factorization parameters with this config's overrides applied.
    pub fn matrix_factorization_params(&self) -> MatrixFactorizationParams {
        let defaults = MatrixFactorizationParams::default();
        MatrixFactorizationParams {
            rank: self.rank.unwrap_or(defaults.rank),
            iterations: self.iterations.unwrap_or(defaults.iterations),
            learning_rate: self.learning_rate.unwrap_or(defaults.learning_rate),
            seed: self.seed,
            verbosity: self.verbosity,
            ..defaults
        }
    }

    /// Field-aware parameters with this config's overrides applied.
    pub fn field_aware_params(&self) -> FieldAwareParams {
        let defaults = FieldAwareParams::default();
        FieldAwareParams {
            latent_dim: self.rank.unwrap_or(defaults.latent_dim),
            iterations: self.iterations.unwrap_or(defaults.iterations),
            learning_rate: self.learning_rate.unwrap_or(defaults.learning_rate),
            seed: self.seed,
            verbosity: self.verbosity,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PipelineConfig {
        PipelineConfig::builder()
            .ratings_path("ratings.csv")
            .seed(1)
            .build()
            .unwrap()
    }

    #[test]
    fn defaults() {
        let config = base();
        assert_eq!(config.algorithm, Algorithm::MatrixFactorization);
        assert_eq!(config.train_path, PathBuf::from("ratings-train.csv"));
        assert_eq!(config.test_path, PathBuf::from("ratings-test.csv"));
        assert_eq!(config.split_fraction, 0.9);
        assert_eq!(config.probe(), Probe::new("191", "20"));

        let mf = config.matrix_factorization_params();
        assert_eq!(mf.rank, 22);
        assert_eq!(mf.iterations, 191);
        assert_eq!(mf.seed, 1);
    }

    #[test]
    fn overrides_apply_to_selected_family() {
        let config = PipelineConfig::builder()
            .ratings_path("ratings.csv")
            .seed(3)
            .algorithm(Algorithm::FieldAware)
            .rank(4)
            .learning_rate(0.2)
            .build()
            .unwrap();
        let ffm = config.field_aware_params();
        assert_eq!(ffm.latent_dim, 4);
        assert_eq!(ffm.learning_rate, 0.2);
        assert_eq!(ffm.iterations, FieldAwareParams::default().iterations);
        assert_eq!(config.probe(), Probe::new("6", "15"));
    }

    #[test]
    fn validation_errors() {
        let err = PipelineConfig::builder()
            .ratings_path("r.csv")
            .seed(1)
            .rank(0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidRank);

        let err = PipelineConfig::builder()
            .ratings_path("r.csv")
            .seed(1)
            .learning_rate(f32::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLearningRate(_)));

        let err = PipelineConfig::builder()
            .ratings_path("")
            .seed(1)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingPath("ratings_path"));
    }

    #[test]
    fn from_json_requires_seed() {
        let err = PipelineConfig::from_json_str(r#"{"ratings_path": "r.csv"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed(ref m) if m.contains("seed")));

        let config = PipelineConfig::from_json_str(
            r#"{"ratings_path": "r.csv", "seed": 9, "algorithm": "field_aware",
                "verbosity": "silent", "probe": {"user": "1", "movie": "2"}}"#,
        )
        .unwrap();
        assert_eq!(config.algorithm, Algorithm::FieldAware);
        assert_eq!(config.verbosity, Verbosity::Silent);
        assert_eq!(config.probe(), Probe::new("1", "2"));
    }

    #[test]
    fn from_json_validates() {
        let json = r#"{"ratings_path": "r.csv", "seed": 9, "split_fraction": 0}"#;
        let err = PipelineConfig::from_json_str(json).unwrap_err();
        assert_eq!(err, ConfigError::InvalidSplitFraction(0.0));
    }

    #[test]
    fn algorithm_from_str() {
        assert_eq!("mf".parse::<Algorithm>().unwrap(), Algorithm::MatrixFactorization);
        assert_eq!("field-aware".parse::<Algorithm>().unwrap(), Algorithm::FieldAware);
        assert!("svd".parse::<Algorithm>().is_err());
    }
}
