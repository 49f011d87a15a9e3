//! Conversion between runtime models and payload types.
//!
//! # High-Level API
//!
//! ```
//! use movierec::io;
//! use movierec::testing::synthetic_ratings;
//! use movierec::{MatrixFactorizationParams, MatrixFactorizationTrainer, Recommender, Trainer};
//!
//! let params = MatrixFactorizationParams { rank: 2, iterations: 3, ..Default::default() };
//! let ratings = synthetic_ratings(5, 5, 20, 1);
//! let model = MatrixFactorizationTrainer::new(params).fit(&ratings).unwrap();
//! let schema = model.schema();
//!
//! let bytes = io::to_bytes(&model.clone().into_model(), &schema).unwrap();
//! let (restored, restored_schema) = io::from_bytes(&bytes).unwrap();
//! assert_eq!(restored_schema, schema);
//! assert_eq!(restored.as_matrix_factorization(), Some(&model));
//! ```

use std::io::Write;
use std::path::Path;

use ndarray::{Array1, Array2, Array3};

use super::native::{DeserializeError, ModelType, NativeCodec, SerializeError};
use super::payload::{
    FieldAwarePayload, MatrixFactorizationPayload, ModelPayload, Payload, PayloadV1,
};
use crate::data::{InputSchema, LabeledRecord, RatingRecord, RelevanceRecord};
use crate::encoding::{HashedTextEncoder, KeyEncoder, MOVIE_FIELD, N_FIELDS, USER_FIELD};
use crate::model::{FieldAwareModel, MatrixFactorizationModel, Model, ModelMeta, TaskKind};
use crate::repr::{FieldAwareWeights, LatentFactors};

// ============================================================================
// Bytes and Files
// ============================================================================

/// Serialize a model and its input schema to bytes (header included).
pub fn to_bytes(model: &Model, schema: &InputSchema) -> Result<Vec<u8>, SerializeError> {
    let payload = Payload::from_model(model, schema);
    NativeCodec::new().serialize(model_type(model), header_shape(model), &payload)
}

/// Deserialize and validate a model and its input schema.
pub fn from_bytes(bytes: &[u8]) -> Result<(Model, InputSchema), DeserializeError> {
    let (header, payload): (_, Payload) = NativeCodec::new().deserialize(bytes)?;
    let (model, schema) = payload.into_model()?;

    let actual = model_type(&model);
    if header.model_type != actual {
        return Err(DeserializeError::TypeMismatch {
            header: header.model_type,
            payload: actual,
        });
    }
    if header.shape != header_shape(&model) {
        return Err(DeserializeError::CorruptPayload(format!(
            "header shape {:?} does not match payload {:?}",
            header.shape,
            header_shape(&model)
        )));
    }
    Ok((model, schema))
}

/// Save a model and its schema to `path`.
///
/// The artifact is written to a temporary file in the destination directory and renamed
/// into place, so `path` either keeps its previous content or holds the complete artifact.
pub fn save(model: &Model, schema: &InputSchema, path: impl AsRef<Path>) -> crate::Result<()> {
    let path = path.as_ref();
    let bytes = to_bytes(model, schema)?;
    let staged = super::stage(path, |file| file.write_all(&bytes))?;
    super::commit(staged, path)?;
    tracing::info!(
        path = %path.display(),
        bytes = bytes.len(),
        task = ?model.task(),
        "saved model"
    );
    Ok(())
}

/// Load a model and the schema it was saved with.
pub fn load(path: impl AsRef<Path>) -> crate::Result<(Model, InputSchema)> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let loaded = from_bytes(&bytes)?;
    tracing::debug!(path = %path.display(), task = ?loaded.0.task(), "loaded model");
    Ok(loaded)
}

fn model_type(model: &Model) -> ModelType {
    match model {
        Model::MatrixFactorization(_) => ModelType::MatrixFactorization,
        Model::FieldAware(_) => ModelType::FieldAware,
    }
}

fn header_shape(model: &Model) -> [u32; 2] {
    match model {
        Model::MatrixFactorization(m) => [
            m.factors().n_user_keys() as u32,
            m.factors().n_movie_keys() as u32,
        ],
        Model::FieldAware(m) => [
            m.weights().n_features() as u32,
            m.weights().latent_dim() as u32,
        ],
    }
}

// ============================================================================
// Model -> Payload Conversion
// ============================================================================

impl Payload {
    /// Create a V1 payload from a model.
    pub fn from_model(model: &Model, schema: &InputSchema) -> Self {
        let model_payload = match model {
            Model::MatrixFactorization(m) => ModelPayload::MatrixFactorization(mf_to_payload(m)),
            Model::FieldAware(m) => ModelPayload::FieldAware(ffm_to_payload(m)),
        };
        Payload::V1(PayloadV1 {
            schema: schema.clone(),
            meta: model.meta().clone(),
            model: model_payload,
        })
    }

    /// Rebuild the model, validating every length and the embedded schema.
    pub fn into_model(self) -> Result<(Model, InputSchema), DeserializeError> {
        let Payload::V1(v1) = self;
        let PayloadV1 {
            schema,
            meta,
            model,
        } = v1;

        let (model, expected_schema, expected_task) = match model {
            ModelPayload::MatrixFactorization(p) => (
                Model::MatrixFactorization(payload_to_mf(p, meta)?),
                RatingRecord::schema(),
                TaskKind::Regression,
            ),
            ModelPayload::FieldAware(p) => (
                Model::FieldAware(payload_to_ffm(p, meta)?),
                RelevanceRecord::schema(),
                TaskKind::BinaryClassification,
            ),
        };

        if model.task() != expected_task {
            return Err(DeserializeError::CorruptPayload(format!(
                "metadata task {:?} does not match model kind",
                model.task()
            )));
        }
        if schema != expected_schema {
            return Err(DeserializeError::SchemaMismatch(model_type(&model)));
        }
        Ok((model, schema))
    }
}

fn mf_to_payload(m: &MatrixFactorizationModel) -> MatrixFactorizationPayload {
    let f = m.factors();
    MatrixFactorizationPayload {
        user_keys: m.users().keys().to_vec(),
        movie_keys: m.movies().keys().to_vec(),
        rank: f.rank() as u32,
        global_mean: f.global_mean(),
        user_bias: f.user_bias().to_vec(),
        movie_bias: f.movie_bias().to_vec(),
        user_factors: f.user_factors().iter().copied().collect(),
        movie_factors: f.movie_factors().iter().copied().collect(),
    }
}

fn ffm_to_payload(m: &FieldAwareModel) -> FieldAwarePayload {
    let enc = m.encoder();
    let w = m.weights();
    FieldAwarePayload {
        n_buckets: enc.n_buckets(),
        active_buckets: vec![enc.active_buckets(USER_FIELD), enc.active_buckets(MOVIE_FIELD)],
        n_fields: w.n_fields() as u32,
        latent_dim: w.latent_dim() as u32,
        bias: w.bias(),
        linear: w.linear().to_vec(),
        latent: w.latent().iter().copied().collect(),
    }
}

// ============================================================================
// Payload -> Model Conversion
// ============================================================================

fn corrupt(msg: impl Into<String>) -> DeserializeError {
    DeserializeError::CorruptPayload(msg.into())
}

fn check_len(what: &str, actual: usize, expected: Option<usize>) -> Result<(), DeserializeError> {
    match expected {
        Some(e) if e == actual => Ok(()),
        Some(e) => Err(corrupt(format!("{what}: expected {e} values, got {actual}"))),
        None => Err(corrupt(format!("{what}: size overflow"))),
    }
}

fn payload_to_mf(
    p: MatrixFactorizationPayload,
    meta: ModelMeta,
) -> Result<MatrixFactorizationModel, DeserializeError> {
    let rank = p.rank as usize;
    let n_users = p.user_keys.len() + 1;
    let n_movies = p.movie_keys.len() + 1;

    check_len("user_bias", p.user_bias.len(), Some(n_users))?;
    check_len("movie_bias", p.movie_bias.len(), Some(n_movies))?;
    check_len("user_factors", p.user_factors.len(), n_users.checked_mul(rank))?;
    check_len("movie_factors", p.movie_factors.len(), n_movies.checked_mul(rank))?;

    let users = KeyEncoder::from_keys(p.user_keys).ok_or_else(|| corrupt("duplicate user ids"))?;
    let movies = KeyEncoder::from_keys(p.movie_keys).ok_or_else(|| corrupt("duplicate movie ids"))?;

    let user_factors = Array2::from_shape_vec((n_users, rank), p.user_factors)
        .map_err(|e| corrupt(e.to_string()))?;
    let movie_factors = Array2::from_shape_vec((n_movies, rank), p.movie_factors)
        .map_err(|e| corrupt(e.to_string()))?;
    let factors = LatentFactors::from_parts(
        p.global_mean,
        Array1::from(p.user_bias),
        Array1::from(p.movie_bias),
        user_factors,
        movie_factors,
    )
    .map_err(corrupt)?;

    Ok(MatrixFactorizationModel::new(users, movies, factors, meta))
}

fn payload_to_ffm(
    p: FieldAwarePayload,
    meta: ModelMeta,
) -> Result<FieldAwareModel, DeserializeError> {
    if p.n_fields as usize != N_FIELDS {
        return Err(corrupt(format!("expected {N_FIELDS} fields, got {}", p.n_fields)));
    }
    let active: [Vec<u32>; N_FIELDS] =
        p.active_buckets.try_into().map_err(|v: Vec<Vec<u32>>| {
            corrupt(format!("expected {N_FIELDS} bucket lists, got {}", v.len()))
        })?;

    // Lengths are checked against the stored tables before any bucket set is allocated.
    let n_features = (p.n_buckets as usize + 1) * N_FIELDS;
    let k = p.latent_dim as usize;
    check_len("linear", p.linear.len(), Some(n_features))?;
    check_len(
        "latent",
        p.latent.len(),
        n_features.checked_mul(N_FIELDS).and_then(|n| n.checked_mul(k)),
    )?;

    let encoder = HashedTextEncoder::from_active(p.n_buckets, active)
        .ok_or_else(|| corrupt("invalid hash bucket layout"))?;

    let latent = Array3::from_shape_vec((n_features, N_FIELDS, k), p.latent)
        .map_err(|e| corrupt(e.to_string()))?;
    let weights =
        FieldAwareWeights::from_parts(p.bias, Array1::from(p.linear), latent).map_err(corrupt)?;

    Ok(FieldAwareModel::new(encoder, weights, meta))
}

// ============================================================================
// Tests
// ============================================================================
