//! Fitted field-aware factorization machine.

use super::{ModelMeta, Recommender};
use crate::data::RelevanceRecord;
use crate::encoding::HashedTextEncoder;
use crate::evaluation::{ClassificationMetrics, Metrics};
use crate::inference::RelevancePrediction;
use crate::model::Model;
use crate::repr::FieldAwareWeights;

/// Relevance classifier: frozen hashed encoder plus FFM weights.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAwareModel {
    encoder: HashedTextEncoder,
    weights: FieldAwareWeights,
    meta: ModelMeta,
}

impl FieldAwareModel {
    /// Assemble a model.
    ///
    /// # Panics
    ///
    /// Panics if the weight table does not cover the encoder's feature space.
    pub fn new(encoder: HashedTextEncoder, weights: FieldAwareWeights, meta: ModelMeta) -> Self {
        assert_eq!(weights.n_features(), encoder.n_features(), "feature space mismatch");
        Self {
            encoder,
            weights,
            meta,
        }
    }

    pub fn encoder(&self) -> &HashedTextEncoder {
        &self.encoder
    }

    pub fn weights(&self) -> &FieldAwareWeights {
        &self.weights
    }

    /// Raw classifier output for a pair of raw ids.
    #[inline]
    pub fn logit(&self, user: &str, movie: &str) -> f32 {
        self.weights.logit(&self.encoder.encode(user, movie))
    }
}

impl Recommender for FieldAwareModel {
    type Record = RelevanceRecord;
    type Output = RelevancePrediction;

    fn predict(&self, user: &String, movie: &String) -> RelevancePrediction {
        RelevancePrediction::from_logit(self.logit(user, movie))
    }

    fn evaluate(&self, test: &[RelevanceRecord]) -> Metrics {
        let logits: Vec<f32> = test
            .iter()
            .map(|r| self.logit(&r.user_id, &r.movie_id))
            .collect();
        let labels: Vec<bool> = test.iter().map(|r| r.label).collect();
        Metrics::Classification(ClassificationMetrics::compute(&logits, &labels))
    }

    fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    fn into_model(self) -> Model {
        Model::FieldAware(self)
    }
}
