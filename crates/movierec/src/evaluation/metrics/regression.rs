//! Regression metrics.

use ndarray::ArrayView1;

use super::{MetricFn, PredictionKind};

fn squared_error_sum(predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
    predictions
        .iter()
        .zip(targets.iter())
        .map(|(&p, &l)| {
            let diff = (p as f64) - (l as f64);
            diff * diff
        })
        .sum()
}

// =============================================================================
// RMSE (Root Mean Squared Error)
// =============================================================================

/// Root Mean Squared Error: sqrt(mean((pred - label)²))
///
/// Lower is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rmse;

impl MetricFn for Rmse {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        Mse.compute(predictions, targets).sqrt()
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn expected_prediction_kind(&self) -> PredictionKind {
        PredictionKind::Value
    }

    fn name(&self) -> &'static str {
        "rmse"
    }
}

// =============================================================================
// MSE (Mean Squared Error)
// =============================================================================

/// Mean Squared Error: mean((pred - label)²)
#[derive(Debug, Clone, Copy, Default)]
pub struct Mse;

impl MetricFn for Mse {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let n = predictions.len();
        if n == 0 {
            return 0.0;
        }
        squared_error_sum(predictions, targets) / n as f64
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn expected_prediction_kind(&self) -> PredictionKind {
        PredictionKind::Value
    }

    fn name(&self) -> &'static str {
        "mse"
    }
}

// =============================================================================
// MAE (Mean Absolute Error)
// =============================================================================

/// Mean Absolute Error: mean(|pred - label|)
///
/// Lower is better. More robust to outliers than RMSE.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mae;

impl MetricFn for Mae {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let n = predictions.len();
        if n == 0 {
            return 0.0;
        }
        let sum_ae: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(&p, &l)| ((p as f64) - (l as f64)).abs())
            .sum();
        sum_ae / n as f64
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn expected_prediction_kind(&self) -> PredictionKind {
        PredictionKind::Value
    }

    fn name(&self) -> &'static str {
        "mae"
    }
}

// =============================================================================
// R² (Coefficient of Determination)
// =============================================================================

/// R²: 1 - SS_res / SS_tot.
///
/// Higher is better; 1 is a perfect fit, 0 matches predicting the mean. Constant targets
/// give 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct RSquared;

impl MetricFn for RSquared {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let n = targets.len();
        if n == 0 {
            return 0.0;
        }
        let mean = targets.iter().map(|&l| l as f64).sum::<f64>() / n as f64;
        let ss_tot: f64 = targets
            .iter()
            .map(|&l| {
                let d = l as f64 - mean;
                d * d
            })
            .sum();
        if ss_tot == 0.0 {
            return 0.0;
        }
        1.0 - squared_error_sum(predictions, targets) / ss_tot
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn expected_prediction_kind(&self) -> PredictionKind {
        PredictionKind::Value
    }

    fn name(&self) -> &'static str {
        "r_squared"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn rmse_perfect() {
        let p = array![1.0f32, 2.0, 3.0];
        assert_abs_diff_eq!(Rmse.compute(p.view(), p.view()), 0.0);
    }

    #[test]
    fn rmse_known_value() {
        let p = array![1.0f32, 2.0, 3.0, 4.0];
        let l = array![2.0f32, 2.0, 3.0, 2.0];
        // errors 1, 0, 0, 2 -> mse 5/4
        assert_abs_diff_eq!(Mse.compute(p.view(), l.view()), 1.25, epsilon = 1e-12);
        assert_abs_diff_eq!(Rmse.compute(p.view(), l.view()), 1.25f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(Mae.compute(p.view(), l.view()), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn r_squared_known_values() {
        let l = array![1.0f32, 2.0, 3.0];
        assert_abs_diff_eq!(RSquared.compute(l.view(), l.view()), 1.0);
        let mean = array![2.0f32, 2.0, 2.0];
        assert_abs_diff_eq!(RSquared.compute(mean.view(), l.view()), 0.0);
        assert_abs_diff_eq!(RSquared.compute(l.view(), mean.view()), 0.0);
    }

    #[test]
    fn empty_is_zero() {
        let e = ndarray::Array1::<f32>::zeros(0);
        assert_eq!(Rmse.compute(e.view(), e.view()), 0.0);
        assert_eq!(Mae.compute(e.view(), e.view()), 0.0);
        assert_eq!(RSquared.compute(e.view(), e.view()), 0.0);
    }

    #[test]
    fn direction() {
        assert!(!Rmse.higher_is_better());
        assert!(RSquared.higher_is_better());
        assert_eq!(Mae.name(), "mae");
    }
}
