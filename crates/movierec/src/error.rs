//! Crate-level error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::data::ParseError;
use crate::io::{DeserializeError, SerializeError};
use crate::training::TrainingError;

/// Any failure surfaced by the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input rows or ids.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Invalid hyperparameters, empty training data, or divergence.
    #[error("training failed: {0}")]
    Training(#[from] TrainingError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A model artifact could not be decoded or failed validation.
    #[error("corrupt model artifact: {0}")]
    CorruptArtifact(DeserializeError),

    /// A model could not be encoded.
    #[error("failed to serialize model: {0}")]
    Serialize(SerializeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<DeserializeError> for Error {
    fn from(err: DeserializeError) -> Self {
        match err {
            DeserializeError::Io(e) => Self::Io(e),
            other => Self::CorruptArtifact(other),
        }
    }
}

impl From<SerializeError> for Error {
    fn from(err: SerializeError) -> Self {
        match err {
            SerializeError::Io(e) => Self::Io(e),
            other => Self::Serialize(other),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(e) => Self::Io(e),
                // is_io_error() guarantees the Io kind
                _ => Self::Io(std::io::Error::other("csv I/O error")),
            }
        } else {
            Self::Parse(ParseError::Csv(err))
        }
    }
}
