//! Matrix factorization trainer.
//!
//! Stochastic gradient descent on squared error with L2 regularization over a global mean,
//! per-user and per-movie biases, and rank-`k` latent factors. Each iteration visits every
//! training row once in an order drawn from a seeded `Xoshiro256PlusPlus`.

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::{TrainingError, TrainingLogger, Trainer, Verbosity};
use super::{check_non_negative, check_nonzero, check_positive};
use crate::data::RatingRecord;
use crate::encoding::KeyEncoder;
use crate::model::{MatrixFactorizationModel, ModelMeta};
use crate::repr::LatentFactors;

// ============================================================================
// MatrixFactorizationParams
// ============================================================================

/// Parameters for matrix factorization training.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixFactorizationParams {
    /// Latent dimension.
    pub rank: u32,

    /// Number of passes over the training rows.
    pub iterations: u32,

    /// SGD step size.
    pub learning_rate: f32,

    /// L2 penalty on biases and factors.
    pub lambda: f32,

    /// Factors start uniform in `[-init_scale, init_scale]`.
    pub init_scale: f32,

    /// Seed for factor initialization and visiting order.
    pub seed: u64,

    pub verbosity: Verbosity,
}

impl Default for MatrixFactorizationParams {
    fn default() -> Self {
        Self {
            rank: 22,
            iterations: 191,
            learning_rate: 0.05,
            lambda: 0.05,
            init_scale: 0.1,
            seed: 42,
            verbosity: Verbosity::default(),
        }
    }
}

impl MatrixFactorizationParams {
    pub fn validate(&self) -> Result<(), TrainingError> {
        check_nonzero("rank", self.rank)?;
        check_nonzero("iterations", self.iterations)?;
        check_positive("learning_rate", self.learning_rate)?;
        check_non_negative("lambda", self.lambda)?;
        check_non_negative("init_scale", self.init_scale)?;
        Ok(())
    }
}

// ============================================================================
// MatrixFactorizationTrainer
// ============================================================================

/// Fits a [`MatrixFactorizationModel`] from star ratings.
#[derive(Clone, Debug, Default)]
pub struct MatrixFactorizationTrainer {
    params: MatrixFactorizationParams,
}

impl MatrixFactorizationTrainer {
    pub fn new(params: MatrixFactorizationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MatrixFactorizationParams {
        &self.params
    }
}

impl Trainer for MatrixFactorizationTrainer {
    type Record = RatingRecord;
    type Model = MatrixFactorizationModel;

    fn fit(&self, train: &[RatingRecord]) -> Result<MatrixFactorizationModel, TrainingError> {
        let params = &self.params;
        params.validate()?;
        if train.is_empty() {
            return Err(TrainingError::EmptyTrainingSet);
        }

        let users = KeyEncoder::fit(train.iter().map(|r| r.user_id));
        let movies = KeyEncoder::fit(train.iter().map(|r| r.movie_id));

        // Encode once; the hot loop works on dense keys only.
        let rows: Vec<(usize, usize, f32)> = train
            .iter()
            .map(|r| {
                (
                    users.encode(&r.user_id) as usize,
                    movies.encode(&r.movie_id) as usize,
                    r.label,
                )
            })
            .collect();

        let rank = params.rank as usize;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        let mut factors = LatentFactors::zeros(users.n_keys(), movies.n_keys(), rank);
        factors.global_mean =
            (rows.iter().map(|&(_, _, y)| y as f64).sum::<f64>() / rows.len() as f64) as f32;

        // Row 0 (unknown) stays zero.
        let scale = params.init_scale;
        for mut row in factors.user_factors.rows_mut().into_iter().skip(1) {
            row.mapv_inplace(|_| (rng.r#gen::<f32>() * 2.0 - 1.0) * scale);
        }
        for mut row in factors.movie_factors.rows_mut().into_iter().skip(1) {
            row.mapv_inplace(|_| (rng.r#gen::<f32>() * 2.0 - 1.0) * scale);
        }

        let mut logger = TrainingLogger::new(params.verbosity);
        logger.start_training("matrix_factorization", params.iterations as usize, rows.len());

        let lr = params.learning_rate;
        let lambda = params.lambda;
        let mut order: Vec<usize> = (0..rows.len()).collect();
        let mut final_loss = None;

        for iteration in 0..params.iterations as usize {
            order.shuffle(&mut rng);
            let mut sum_sq = 0.0f64;

            for &i in &order {
                let (u, m, y) = rows[i];
                let err = y - factors.predict(u as u32, m as u32);
                sum_sq += (err as f64) * (err as f64);

                factors.user_bias[u] += lr * (err - lambda * factors.user_bias[u]);
                factors.movie_bias[m] += lr * (err - lambda * factors.movie_bias[m]);

                for k in 0..rank {
                    let p = factors.user_factors[[u, k]];
                    let q = factors.movie_factors[[m, k]];
                    factors.user_factors[[u, k]] += lr * (err * q - lambda * p);
                    factors.movie_factors[[m, k]] += lr * (err * p - lambda * q);
                }
            }

            let rmse = (sum_sq / rows.len() as f64).sqrt();
            if !rmse.is_finite() {
                logger.log_divergence(iteration);
                return Err(TrainingError::Diverged { iteration });
            }
            logger.log_iteration(iteration, rmse);
            final_loss = Some(rmse);
        }

        if !factors.is_finite() {
            return Err(TrainingError::Diverged {
                iteration: params.iterations as usize - 1,
            });
        }

        logger.finish_training(final_loss);

        let meta = ModelMeta::for_regression(rows.len(), params.iterations, params.seed)
            .with_final_loss(final_loss);
        Ok(MatrixFactorizationModel::new(users, movies, factors, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Recommender;
    use crate::testing::synthetic_ratings;

    fn toy() -> Vec<RatingRecord> {
        vec![
            RatingRecord::new(1, 10, 5.0),
            RatingRecord::new(1, 20, 1.0),
            RatingRecord::new(2, 10, 4.0),
            RatingRecord::new(2, 20, 2.0),
        ]
    }

    fn quick(rank: u32, iterations: u32) -> MatrixFactorizationTrainer {
        MatrixFactorizationTrainer::new(MatrixFactorizationParams {
            rank,
            iterations,
            ..Default::default()
        })
    }

    #[test]
    fn learns_toy_preferences() {
        let model = quick(1, 50).fit(&toy()).unwrap();
        let liked = model.predict(&1, &10).score;
        let disliked = model.predict(&1, &20).score;
        assert!((liked - 5.0).abs() < (liked - 1.0).abs(), "liked = {liked}");
        assert!(liked > disliked);
    }

    #[test]
    fn deterministic_given_seed() {
        let data = synthetic_ratings(20, 15, 200, 3);
        let a = quick(4, 10).fit(&data).unwrap();
        let b = quick(4, 10).fit(&data).unwrap();
        assert_eq!(a.factors(), b.factors());
    }

    #[test]
    fn different_seeds_differ() {
        let data = synthetic_ratings(20, 15, 200, 3);
        let a = quick(4, 5).fit(&data).unwrap();
        let mut params = MatrixFactorizationParams { rank: 4, iterations: 5, ..Default::default() };
        params.seed = 7;
        let b = MatrixFactorizationTrainer::new(params).fit(&data).unwrap();
        assert_ne!(a.factors(), b.factors());
    }

    #[test]
    fn does_not_mutate_input() {
        let data = toy();
        let copy = data.clone();
        quick(2, 3).fit(&data).unwrap();
        assert_eq!(data, copy);
    }

    #[test]
    fn unknown_ids_predict_global_mean() {
        let model = quick(2, 20).fit(&toy()).unwrap();
        let p = model.predict(&999, &888).score;
        assert_eq!(p, model.factors().global_mean());
    }

    #[test]
    fn empty_training_set() {
        assert_eq!(quick(2, 2).fit(&[]).unwrap_err(), TrainingError::EmptyTrainingSet);
    }

    #[test]
    fn invalid_parameters() {
        assert!(matches!(
            quick(0, 5).fit(&toy()),
            Err(TrainingError::InvalidParameter { name: "rank", .. })
        ));
        assert!(matches!(
            quick(2, 0).fit(&toy()),
            Err(TrainingError::InvalidParameter { name: "iterations", .. })
        ));
        let trainer = MatrixFactorizationTrainer::new(MatrixFactorizationParams {
            learning_rate: -1.0,
            ..Default::default()
        });
        assert!(matches!(
            trainer.fit(&toy()),
            Err(TrainingError::InvalidParameter { name: "learning_rate", .. })
        ));
    }

    #[test]
    fn huge_learning_rate_diverges() {
        let trainer = MatrixFactorizationTrainer::new(MatrixFactorizationParams {
            rank: 4,
            iterations: 50,
            learning_rate: 1e6,
            ..Default::default()
        });
        assert!(matches!(
            trainer.fit(&synthetic_ratings(10, 10, 100, 1)),
            Err(TrainingError::Diverged { .. })
        ));
    }
}
