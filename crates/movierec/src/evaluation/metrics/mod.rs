//! Scalar scores over held-out predictions.
//!
//! Rating models are judged by [`Rmse`], [`Mae`], [`Mse`] and [`RSquared`];
//! relevance models by [`Accuracy`], [`Auc`], [`LogLoss`] and [`F1Score`].
//! Every metric maps a prediction view and a same-length target view to one
//! number. Empty inputs score `0.0`, except AUC which scores `0.5`.

mod classification;
mod regression;

pub use classification::{Accuracy, Auc, F1Score, LogLoss};
pub use regression::{Mae, Mse, RSquared, Rmse};

use ndarray::ArrayView1;

/// What space a metric expects its predictions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionKind {
    /// Raw regression output.
    Value,
    /// Classifier logit; the decision boundary is 0.
    Margin,
    /// Probability in `[0, 1]`.
    Probability,
}

/// A metric function.
pub trait MetricFn {
    /// Compute the metric value.
    ///
    /// Classification targets are `1.0` for positive and `0.0` for negative.
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64;

    fn expected_prediction_kind(&self) -> PredictionKind;

    /// `true` for accuracy, AUC, F1 and R².
    fn higher_is_better(&self) -> bool;

    /// Short label used in reports and logs.
    fn name(&self) -> &'static str;
}
