//! Fitted matrix-factorization model.

use super::{ModelMeta, Recommender};
use crate::data::RatingRecord;
use crate::encoding::KeyEncoder;
use crate::evaluation::{Metrics, RegressionMetrics};
use crate::inference::RatingPrediction;
use crate::model::Model;
use crate::repr::LatentFactors;

/// Rating predictor: frozen id encoders plus biased latent factors.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixFactorizationModel {
    users: KeyEncoder<u32>,
    movies: KeyEncoder<u32>,
    factors: LatentFactors,
    meta: ModelMeta,
}

impl MatrixFactorizationModel {
    /// Assemble a model. Factor tables must have one row per key including the unknown row.
    ///
    /// # Panics
    ///
    /// Panics if the factor tables do not match the encoders.
    pub fn new(
        users: KeyEncoder<u32>,
        movies: KeyEncoder<u32>,
        factors: LatentFactors,
        meta: ModelMeta,
    ) -> Self {
        assert_eq!(factors.n_user_keys(), users.n_keys(), "user table size mismatch");
        assert_eq!(factors.n_movie_keys(), movies.n_keys(), "movie table size mismatch");
        Self {
            users,
            movies,
            factors,
            meta,
        }
    }

    pub fn users(&self) -> &KeyEncoder<u32> {
        &self.users
    }

    pub fn movies(&self) -> &KeyEncoder<u32> {
        &self.movies
    }

    pub fn factors(&self) -> &LatentFactors {
        &self.factors
    }

    pub fn rank(&self) -> usize {
        self.factors.rank()
    }
}

impl Recommender for MatrixFactorizationModel {
    type Record = RatingRecord;
    type Output = RatingPrediction;

    #[inline]
    fn predict(&self, user: &u32, movie: &u32) -> RatingPrediction {
        RatingPrediction {
            score: self
                .factors
                .predict(self.users.encode(user), self.movies.encode(movie)),
        }
    }

    fn evaluate(&self, test: &[RatingRecord]) -> Metrics {
        let predictions: Vec<f32> = test
            .iter()
            .map(|r| self.predict(&r.user_id, &r.movie_id).score)
            .collect();
        let targets: Vec<f32> = test.iter().map(|r| r.label).collect();
        Metrics::Regression(RegressionMetrics::compute(&predictions, &targets))
    }

    fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    fn into_model(self) -> Model {
        Model::MatrixFactorization(self)
    }
}
