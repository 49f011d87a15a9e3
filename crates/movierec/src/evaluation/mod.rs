//! Held-out evaluation.
//!
//! [`Recommender::evaluate`](crate::model::Recommender::evaluate) scores a test set and
//! returns a [`Metrics`] report built from the metric functions in [`metrics`].

pub mod metrics;

use std::fmt;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::inference::sigmoid_percent;
use metrics::{Accuracy, Auc, F1Score, LogLoss, Mae, MetricFn, Mse, RSquared, Rmse};

/// Regression quality of rating predictions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub mse: f64,
    pub r_squared: f64,
}

impl RegressionMetrics {
    /// Compute all regression metrics. `predictions` and `targets` must be the same length.
    pub fn compute(predictions: &[f32], targets: &[f32]) -> Self {
        debug_assert_eq!(predictions.len(), targets.len());
        let p = ArrayView1::from(predictions);
        let t = ArrayView1::from(targets);
        Self {
            rmse: Rmse.compute(p, t),
            mae: Mae.compute(p, t),
            mse: Mse.compute(p, t),
            r_squared: RSquared.compute(p, t),
        }
    }
}

/// Classification quality of relevance predictions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub auc: f64,
    pub log_loss: f64,
    pub f1: f64,
}

impl Default for ClassificationMetrics {
    fn default() -> Self {
        Self {
            accuracy: 0.0,
            auc: 0.5,
            log_loss: 0.0,
            f1: 0.0,
        }
    }
}

impl ClassificationMetrics {
    /// Compute all classification metrics from classifier logits.
    pub fn compute(logits: &[f32], labels: &[bool]) -> Self {
        debug_assert_eq!(logits.len(), labels.len());
        let targets: Vec<f32> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
        let probabilities: Vec<f32> = logits.iter().map(|&x| sigmoid_percent(x) / 100.0).collect();

        let m = ArrayView1::from(logits);
        let t = ArrayView1::from(targets.as_slice());
        Self {
            accuracy: Accuracy::default().compute(m, t),
            auc: Auc.compute(m, t),
            log_loss: LogLoss.compute(ArrayView1::from(probabilities.as_slice()), t),
            f1: F1Score::default().compute(m, t),
        }
    }
}

/// Evaluation report of either task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Metrics {
    Regression(RegressionMetrics),
    Classification(ClassificationMetrics),
}

impl Metrics {
    pub fn as_regression(&self) -> Option<&RegressionMetrics> {
        match self {
            Self::Regression(m) => Some(m),
            Self::Classification(_) => None,
        }
    }

    pub fn as_classification(&self) -> Option<&ClassificationMetrics> {
        match self {
            Self::Classification(m) => Some(m),
            Self::Regression(_) => None,
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regression(m) => write!(
                f,
                "RMSE: {:.4}, MAE: {:.4}, MSE: {:.4}, R²: {:.4}",
                m.rmse, m.mae, m.mse, m.r_squared
            ),
            Self::Classification(m) => write!(
                f,
                "Accuracy: {:.2}%, AUC: {:.2}%, LogLoss: {:.4}, F1: {:.4}",
                m.accuracy * 100.0,
                m.auc * 100.0,
                m.log_loss,
                m.f1
            ),
        }
    }
}
