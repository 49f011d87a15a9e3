//! Field-aware factorization machine trainer.
//!
//! Logistic loss with per-coordinate AdaGrad steps, following the libffm update rules:
//! for each row, `κ = -y / (1 + e^{y·t})` with `y ∈ {-1, +1}` and `t` the current logit;
//! every touched weight then moves by `lr · g / sqrt(G)` where `g` is its regularized
//! gradient and `G` the running sum of squared gradients (initialized to 1).

use ndarray::{Array1, Array3};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

use super::{TrainingError, TrainingLogger, Trainer, Verbosity};
use super::{check_non_negative, check_nonzero, check_positive};
use crate::data::RelevanceRecord;
use crate::encoding::{DEFAULT_BUCKETS, FeatureVector, HashedTextEncoder, N_FIELDS};
use crate::model::{FieldAwareModel, ModelMeta};
use crate::repr::FieldAwareWeights;

// ============================================================================
// FieldAwareParams
// ============================================================================

/// Parameters for field-aware factorization machine training.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldAwareParams {
    /// Length of each latent vector.
    pub latent_dim: u32,

    /// Number of passes over the training rows.
    pub iterations: u32,

    /// AdaGrad base step size.
    pub learning_rate: f32,

    /// L2 penalty on linear weights.
    pub lambda_linear: f32,

    /// L2 penalty on latent vectors.
    pub lambda_latent: f32,

    /// Hash buckets per field.
    pub n_buckets: u32,

    /// Seed for latent initialization and visiting order.
    pub seed: u64,

    pub verbosity: Verbosity,
}

impl Default for FieldAwareParams {
    fn default() -> Self {
        Self {
            latent_dim: 20,
            iterations: 5,
            learning_rate: 0.1,
            lambda_linear: 1e-4,
            lambda_latent: 1e-4,
            n_buckets: DEFAULT_BUCKETS,
            seed: 42,
            verbosity: Verbosity::default(),
        }
    }
}

impl FieldAwareParams {
    pub fn validate(&self) -> Result<(), TrainingError> {
        check_nonzero("latent_dim", self.latent_dim)?;
        check_nonzero("iterations", self.iterations)?;
        check_nonzero("n_buckets", self.n_buckets)?;
        check_positive("learning_rate", self.learning_rate)?;
        check_non_negative("lambda_linear", self.lambda_linear)?;
        check_non_negative("lambda_latent", self.lambda_latent)?;
        Ok(())
    }
}

// ============================================================================
// AdaGrad state
// ============================================================================

/// Squared-gradient accumulators mirroring [`FieldAwareWeights`].
struct AdaGrad {
    bias: f32,
    linear: Array1<f32>,
    latent: Array3<f32>,
}

impl AdaGrad {
    fn new(weights: &FieldAwareWeights) -> Self {
        Self {
            bias: 1.0,
            linear: Array1::ones(weights.linear.raw_dim()),
            latent: Array3::ones(weights.latent.raw_dim()),
        }
    }
}

/// `log(1 + e^z)` without overflow.
#[inline]
fn softplus(z: f32) -> f32 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

// ============================================================================
// FieldAwareTrainer
// ============================================================================

/// Fits a [`FieldAwareModel`] from relevance labels.
#[derive(Clone, Debug, Default)]
pub struct FieldAwareTrainer {
    params: FieldAwareParams,
}

impl FieldAwareTrainer {
    pub fn new(params: FieldAwareParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FieldAwareParams {
        &self.params
    }

    /// One AdaGrad step on a single row. Returns the row's loss before the update.
    fn step(
        &self,
        weights: &mut FieldAwareWeights,
        state: &mut AdaGrad,
        x: &FeatureVector,
        y: f32,
    ) -> f32 {
        let params = &self.params;
        let lr = params.learning_rate;
        let t = weights.logit(x);
        let loss = softplus(-y * t);
        let kappa = -y / (1.0 + (y * t).exp());

        let g = kappa;
        state.bias += g * g;
        weights.bias -= lr * g / state.bias.sqrt();

        for f in x {
            let j = f.index as usize;
            let g = params.lambda_linear * weights.linear[j] + kappa * f.value;
            state.linear[j] += g * g;
            weights.linear[j] -= lr * g / state.linear[j].sqrt();
        }

        let features = &x.features;
        let k = weights.latent_dim();
        for (a, fa) in features.iter().enumerate() {
            for fb in &features[a + 1..] {
                let (j1, f1) = (fa.index as usize, fa.field);
                let (j2, f2) = (fb.index as usize, fb.field);
                let scale = kappa * fa.value * fb.value;
                for d in 0..k {
                    let v1 = weights.latent[[j1, f2, d]];
                    let v2 = weights.latent[[j2, f1, d]];
                    let g1 = params.lambda_latent * v1 + scale * v2;
                    let g2 = params.lambda_latent * v2 + scale * v1;

                    state.latent[[j1, f2, d]] += g1 * g1;
                    state.latent[[j2, f1, d]] += g2 * g2;
                    weights.latent[[j1, f2, d]] -= lr * g1 / state.latent[[j1, f2, d]].sqrt();
                    weights.latent[[j2, f1, d]] -= lr * g2 / state.latent[[j2, f1, d]].sqrt();
                }
            }
        }

        loss
    }
}

impl Trainer for FieldAwareTrainer {
    type Record = RelevanceRecord;
    type Model = FieldAwareModel;

    fn fit(&self, train: &[RelevanceRecord]) -> Result<FieldAwareModel, TrainingError> {
        let params = &self.params;
        params.validate()?;
        if train.is_empty() {
            return Err(TrainingError::EmptyTrainingSet);
        }

        let encoder = HashedTextEncoder::fit(
            params.n_buckets,
            train.iter().map(|r| (r.user_id.as_str(), r.movie_id.as_str())),
        );
        let rows: Vec<(FeatureVector, f32)> = train
            .iter()
            .map(|r| {
                let y = if r.label { 1.0 } else { -1.0 };
                (encoder.encode(&r.user_id, &r.movie_id), y)
            })
            .collect();

        let k = params.latent_dim as usize;
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        let mut weights = FieldAwareWeights::zeros(encoder.n_features(), N_FIELDS, k);
        let coef = 1.0 / (k as f32).sqrt();
        weights.latent.mapv_inplace(|_| coef * rng.r#gen::<f32>());
        let mut state = AdaGrad::new(&weights);

        let mut logger = TrainingLogger::new(params.verbosity);
        logger.start_training("field_aware", params.iterations as usize, rows.len());

        let mut order: Vec<usize> = (0..rows.len()).collect();
        let mut final_loss = None;

        for iteration in 0..params.iterations as usize {
            order.shuffle(&mut rng);
            let mut sum_loss = 0.0f64;
            for &i in &order {
                let (x, y) = &rows[i];
                sum_loss += self.step(&mut weights, &mut state, x, *y) as f64;
            }

            let loss = sum_loss / rows.len() as f64;
            if !loss.is_finite() || !weights.is_finite() {
                logger.log_divergence(iteration);
                return Err(TrainingError::Diverged { iteration });
            }
            logger.log_iteration(iteration, loss);
            final_loss = Some(loss);
        }

        logger.finish_training(final_loss);

        let meta = ModelMeta::for_binary_classification(rows.len(), params.iterations, params.seed)
            .with_final_loss(final_loss);
        Ok(FieldAwareModel::new(encoder, weights, meta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Recommender;
    use crate::testing::synthetic_relevance;

    fn quick() -> FieldAwareTrainer {
        FieldAwareTrainer::new(FieldAwareParams {
            latent_dim: 4,
            iterations: 10,
            n_buckets: 64,
            ..Default::default()
        })
    }

    #[test]
    fn softplus_is_stable() {
        assert!(softplus(1000.0).is_finite());
        assert_eq!(softplus(-1000.0), 0.0);
        assert!((softplus(0.0) - std::f32::consts::LN_2).abs() < 1e-6);
    }

    #[test]
    fn separates_liked_movies() {
        // Every user likes movies "a*" and dislikes movies "z*".
        let mut train = Vec::new();
        for u in 0..20 {
            for m in 0..5 {
                train.push(RelevanceRecord::new(u.to_string(), format!("a{m}"), true));
                train.push(RelevanceRecord::new(u.to_string(), format!("z{m}"), false));
            }
        }
        let model = quick().fit(&train).unwrap();
        assert!(model.predict(&"3".to_string(), &"a1".to_string()).label);
        assert!(!model.predict(&"3".to_string(), &"z1".to_string()).label);
    }

    #[test]
    fn deterministic_given_seed() {
        let data = synthetic_relevance(15, 10, 150, 5);
        let a = quick().fit(&data).unwrap();
        let b = quick().fit(&data).unwrap();
        assert_eq!(a.weights(), b.weights());
    }

    #[test]
    fn unseen_ids_do_not_fail() {
        let data = synthetic_relevance(5, 5, 30, 1);
        let model = quick().fit(&data).unwrap();
        let p = model.predict(&"nobody".to_string(), &"nothing".to_string());
        assert!(p.logit.is_finite());
        assert!(p.score > 0.0 && p.score < 100.0);
    }

    #[test]
    fn invalid_parameters() {
        let data = synthetic_relevance(5, 5, 30, 1);
        let trainer = FieldAwareTrainer::new(FieldAwareParams {
            latent_dim: 0,
            ..Default::default()
        });
        assert!(matches!(
            trainer.fit(&data),
            Err(TrainingError::InvalidParameter { name: "latent_dim", .. })
        ));
        let trainer = FieldAwareTrainer::new(FieldAwareParams {
            lambda_latent: -1.0,
            ..Default::default()
        });
        assert!(matches!(
            trainer.fit(&data),
            Err(TrainingError::InvalidParameter { name: "lambda_latent", .. })
        ));
        assert_eq!(quick().fit(&[]).unwrap_err(), TrainingError::EmptyTrainingSet);
    }
}
