//! Payload structures for native storage format.
//!
//! These structs are designed for serialization with Postcard. They mirror the runtime
//! types with flat vectors in place of `ndarray` tables; shapes are validated when the
//! runtime types are rebuilt (see [`super::convert`]).

use serde::{Deserialize, Serialize};

use crate::data::InputSchema;
use crate::model::ModelMeta;

// ============================================================================
// Top-Level Payload
// ============================================================================

/// Version-tagged payload enum for forward compatibility.
///
/// New format versions add new variants rather than modifying existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Version 1 payload format.
    V1(PayloadV1),
}

/// Version 1 payload structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadV1 {
    /// Input columns the model was trained on.
    pub schema: InputSchema,
    /// Training metadata.
    pub meta: ModelMeta,
    /// Model-specific payload.
    pub model: ModelPayload,
}

// ============================================================================
// Model Payloads
// ============================================================================

/// Model-specific payload variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelPayload {
    MatrixFactorization(MatrixFactorizationPayload),
    FieldAware(FieldAwarePayload),
}

/// Matrix factorization: key orders plus factor tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixFactorizationPayload {
    /// Raw user ids in key order (key `i + 1`).
    pub user_keys: Vec<u32>,
    /// Raw movie ids in key order (key `i + 1`).
    pub movie_keys: Vec<u32>,
    /// Latent dimension.
    pub rank: u32,
    pub global_mean: f32,
    /// One per user key including the unknown key 0.
    pub user_bias: Vec<f32>,
    /// One per movie key including the unknown key 0.
    pub movie_bias: Vec<f32>,
    /// Row-major `[user_keys.len() + 1, rank]`.
    pub user_factors: Vec<f32>,
    /// Row-major `[movie_keys.len() + 1, rank]`.
    pub movie_factors: Vec<f32>,
}

/// Field-aware factorization machine: hashed encoder state plus weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAwarePayload {
    /// Hash buckets per field.
    pub n_buckets: u32,
    /// Active buckets, one list per field.
    pub active_buckets: Vec<Vec<u32>>,
    pub n_fields: u32,
    pub latent_dim: u32,
    pub bias: f32,
    /// One per global feature index.
    pub linear: Vec<f32>,
    /// Row-major `[n_features, n_fields, latent_dim]`.
    pub latent: Vec<f32>,
}

impl Payload {
    pub fn schema(&self) -> &InputSchema {
        match self {
            Self::V1(v1) => &v1.schema,
        }
    }
}
