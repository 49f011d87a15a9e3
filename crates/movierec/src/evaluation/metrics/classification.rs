//! Binary classification metrics.

use ndarray::ArrayView1;

use super::{MetricFn, PredictionKind};

#[inline]
fn is_positive(label: f32) -> bool {
    label > 0.5
}

// =============================================================================
// LogLoss
// =============================================================================

/// Binary cross-entropy on probabilities, clamped away from 0 and 1.
///
/// Lower is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLoss;

impl MetricFn for LogLoss {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let n = predictions.len();
        if n == 0 {
            return 0.0;
        }

        const EPS: f64 = 1e-15;

        let sum_loss: f64 = predictions
            .iter()
            .zip(targets.iter())
            .map(|(&p, &l)| {
                let p = (p as f64).clamp(EPS, 1.0 - EPS);
                let l = l as f64;
                -(l * p.ln() + (1.0 - l) * (1.0 - p).ln())
            })
            .sum();
        sum_loss / n as f64
    }

    fn higher_is_better(&self) -> bool {
        false
    }

    fn expected_prediction_kind(&self) -> PredictionKind {
        PredictionKind::Probability
    }

    fn name(&self) -> &'static str {
        "logloss"
    }
}

// =============================================================================
// Accuracy
// =============================================================================

/// Fraction of rows whose margin decision (`margin > threshold`) matches the label.
///
/// Higher is better.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accuracy {
    pub threshold: f32,
}

impl MetricFn for Accuracy {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let n = predictions.len();
        if n == 0 {
            return 0.0;
        }
        let correct = predictions
            .iter()
            .zip(targets.iter())
            .filter(|&(&p, &l)| (p > self.threshold) == is_positive(l))
            .count();
        correct as f64 / n as f64
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn expected_prediction_kind(&self) -> PredictionKind {
        PredictionKind::Margin
    }

    fn name(&self) -> &'static str {
        "accuracy"
    }
}

// =============================================================================
// F1
// =============================================================================

/// F1 score of the positive class for margin decisions (`margin > threshold`).
///
/// Higher is better. `0.0` when there are no true positives.
#[derive(Debug, Clone, Copy, Default)]
pub struct F1Score {
    pub threshold: f32,
}

impl MetricFn for F1Score {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
        for (&p, &l) in predictions.iter().zip(targets.iter()) {
            match (p > self.threshold, is_positive(l)) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, true) => fn_ += 1,
                (false, false) => {}
            }
        }
        if tp == 0 {
            return 0.0;
        }
        2.0 * tp as f64 / (2 * tp + fp + fn_) as f64
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn expected_prediction_kind(&self) -> PredictionKind {
        PredictionKind::Margin
    }

    fn name(&self) -> &'static str {
        "f1"
    }
}

// =============================================================================
// AUC
// =============================================================================

/// Area Under the ROC Curve for binary classification.
///
/// Higher is better. Measures ranking quality, so any monotone score (logit or
/// probability) gives the same value. Ties receive their average rank.
#[derive(Debug, Clone, Copy, Default)]
pub struct Auc;

impl MetricFn for Auc {
    fn compute(&self, predictions: ArrayView1<f32>, targets: ArrayView1<f32>) -> f64 {
        let preds: Vec<f32> = predictions.iter().copied().collect();
        let labels: Vec<f32> = targets.iter().copied().collect();
        compute_auc(&preds, &labels)
    }

    fn higher_is_better(&self) -> bool {
        true
    }

    fn expected_prediction_kind(&self) -> PredictionKind {
        PredictionKind::Margin
    }

    fn name(&self) -> &'static str {
        "auc"
    }
}

fn compute_auc(predictions: &[f32], labels: &[f32]) -> f64 {
    let n = predictions.len();

    let n_pos = labels.iter().filter(|&&l| is_positive(l)).count();
    let n_neg = n - n_pos;

    if n_pos == 0 || n_neg == 0 {
        return 0.5;
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by(|&a, &b| predictions[b].total_cmp(&predictions[a]));

    let mut rank_sum_pos = 0.0f64;
    let mut i = 0;

    while i < n {
        let mut j = i + 1;
        while j < n && (predictions[indices[i]] - predictions[indices[j]]).abs() < 1e-10 {
            j += 1;
        }

        let avg_rank = (i + 1 + j) as f64 / 2.0;

        for &idx in indices.iter().take(j).skip(i) {
            if is_positive(labels[idx]) {
                rank_sum_pos += avg_rank;
            }
        }

        i = j;
    }

    // Ranks above are descending; convert to the ascending Mann-Whitney form.
    let n_pos_f = n_pos as f64;
    let n_neg_f = n_neg as f64;
    let sum_ascending_ranks = n_pos_f * (n as f64 + 1.0) - rank_sum_pos;

    (sum_ascending_ranks - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg_f)
}

// =============================================================================
// Tests
// =============================================================================
