//! Model metadata.
//!
//! Training context recorded alongside fitted parameters and persisted with them.

use serde::{Deserialize, Serialize};

/// Type of prediction task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskKind {
    /// Star-rating regression.
    #[default]
    Regression,
    /// Binary relevance classification.
    BinaryClassification,
}

impl TaskKind {
    pub fn is_classification(&self) -> bool {
        matches!(self, Self::BinaryClassification)
    }

    pub fn is_regression(&self) -> bool {
        matches!(self, Self::Regression)
    }
}

/// Shared metadata for all model types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    /// Task type.
    pub task: TaskKind,
    /// Number of training rows seen.
    pub train_rows: usize,
    /// Passes over the training rows.
    pub iterations: u32,
    /// Seed the model was trained with.
    pub seed: u64,
    /// Mean training loss after the last iteration (RMSE or log-loss).
    pub final_loss: Option<f64>,
}

impl ModelMeta {
    /// Create metadata for a regression task.
    pub fn for_regression(train_rows: usize, iterations: u32, seed: u64) -> Self {
        Self {
            task: TaskKind::Regression,
            train_rows,
            iterations,
            seed,
            final_loss: None,
        }
    }

    /// Create metadata for binary classification.
    pub fn for_binary_classification(train_rows: usize, iterations: u32, seed: u64) -> Self {
        Self {
            task: TaskKind::BinaryClassification,
            train_rows,
            iterations,
            seed,
            final_loss: None,
        }
    }

    pub fn with_final_loss(mut self, final_loss: Option<f64>) -> Self {
        self.final_loss = final_loss;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_task() {
        assert!(ModelMeta::for_regression(10, 2, 1).task.is_regression());
        let meta = ModelMeta::for_binary_classification(10, 2, 1).with_final_loss(Some(0.3));
        assert!(meta.task.is_classification());
        assert_eq!(meta.final_loss, Some(0.3));
    }
}
