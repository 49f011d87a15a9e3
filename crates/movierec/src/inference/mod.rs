//! Prediction outputs.
//!
//! - [`RatingPrediction`]: expected star rating from a matrix-factorization model
//! - [`RelevancePrediction`]: relevance decision, logit and percentage from a field-aware model
//! - [`Prediction`]: either of the above, returned when the model kind is only known at runtime

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logistic transform scaled to a percentage: `100 / (1 + e^-x)`.
///
/// `sigmoid_percent(0.0) == 50.0` and the function is strictly increasing. In `f32` the
/// result saturates to exactly `100.0` for `x ≳ 17` and underflows toward `0.0` for very
/// negative inputs, so the open bounds `(0, 100)` hold over a moderate range only.
#[inline]
pub fn sigmoid_percent(x: f32) -> f32 {
    100.0 / (1.0 + (-x).exp())
}

/// Predicted star rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingPrediction {
    pub score: f32,
}

/// Predicted relevance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevancePrediction {
    /// Raw classifier output.
    pub logit: f32,
    /// [`sigmoid_percent`] of the logit.
    pub score: f32,
    /// The classifier's own decision, `logit > 0`.
    pub label: bool,
}

impl RelevancePrediction {
    pub fn from_logit(logit: f32) -> Self {
        Self {
            logit,
            score: sigmoid_percent(logit),
            label: logit > 0.0,
        }
    }

    /// Probability in `[0, 1]`.
    #[inline]
    pub fn probability(&self) -> f32 {
        self.score / 100.0
    }
}

/// Prediction from a model whose kind is only known at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Prediction {
    Rating(RatingPrediction),
    Relevance(RelevancePrediction),
}

impl Prediction {
    /// Headline number: the rating, or the relevance percentage.
    pub fn score(&self) -> f32 {
        match self {
            Self::Rating(p) => p.score,
            Self::Relevance(p) => p.score,
        }
    }
}

impl From<RatingPrediction> for Prediction {
    fn from(p: RatingPrediction) -> Self {
        Self::Rating(p)
    }
}

impl From<RelevancePrediction> for Prediction {
    fn from(p: RelevancePrediction) -> Self {
        Self::Relevance(p)
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rating(p) => write!(f, "predicted rating {:.3}", p.score),
            Self::Relevance(p) => write!(
                f,
                "relevant: {} ({:.2}%, logit {:.4})",
                p.label, p.score, p.logit
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sigmoid_percent_midpoint_and_monotone() {
        assert_eq!(sigmoid_percent(0.0), 50.0);
        let mut prev = sigmoid_percent(-10.0);
        assert!(prev > 0.0);
        for i in -99..=100 {
            let s = sigmoid_percent(i as f32 / 10.0);
            assert!(s > prev, "not increasing at {i}");
            assert!(s < 100.0);
            prev = s;
        }
    }

    #[test]
    fn relevance_label_follows_logit() {
        let p = RelevancePrediction::from_logit(-0.1);
        assert!(!p.label);
        assert!(p.score < 50.0);
        assert_abs_diff_eq!(p.probability(), p.score / 100.0);

        assert!(RelevancePrediction::from_logit(2.0).label);
        assert!(!RelevancePrediction::from_logit(0.0).label);
    }
}
