//! Training progress reporting.
//!
//! [`TrainingLogger`] emits `tracing` events filtered by a [`Verbosity`] level, so a trainer
//! can be silenced per call even when a global subscriber is installed.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// How much a trainer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Nothing.
    #[default]
    Silent,
    /// Divergence and other problems only.
    Warning,
    /// Start, periodic progress and the final summary.
    Info,
    /// Every iteration.
    Debug,
}

/// Per-run logger for iterative trainers.
#[derive(Debug)]
pub struct TrainingLogger {
    verbosity: Verbosity,
    name: &'static str,
    n_iterations: usize,
    started: Option<Instant>,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            name: "model",
            n_iterations: 0,
            started: None,
        }
    }

    #[inline]
    fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }

    pub fn start_training(&mut self, name: &'static str, n_iterations: usize, n_rows: usize) {
        self.name = name;
        self.n_iterations = n_iterations;
        self.started = Some(Instant::now());
        if self.enabled(Verbosity::Info) {
            tracing::info!(
                model = name,
                iterations = n_iterations,
                rows = n_rows,
                "training started"
            );
        }
    }

    /// Report the training loss after `iteration` (0-based).
    ///
    /// At `Info`, roughly ten evenly spaced iterations plus the last are reported.
    pub fn log_iteration(&self, iteration: usize, loss: f64) {
        if self.enabled(Verbosity::Debug) {
            tracing::debug!(model = self.name, iteration, loss, "iteration");
        } else if self.enabled(Verbosity::Info) {
            let every = (self.n_iterations / 10).max(1);
            if (iteration + 1) % every == 0 || iteration + 1 == self.n_iterations {
                tracing::info!(model = self.name, iteration, loss, "iteration");
            }
        }
    }

    pub fn log_divergence(&self, iteration: usize) {
        if self.enabled(Verbosity::Warning) {
            tracing::warn!(model = self.name, iteration, "loss became non-finite, aborting");
        }
    }

    pub fn finish_training(&self, final_loss: Option<f64>) {
        if self.enabled(Verbosity::Info) {
            let elapsed_ms = self.started.map_or(0, |t| t.elapsed().as_millis() as u64);
            tracing::info!(model = self.name, ?final_loss, elapsed_ms, "training finished");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_ordering() {
        assert!(Verbosity::Debug > Verbosity::Info);
        assert!(Verbosity::Warning > Verbosity::Silent);
        assert_eq!(Verbosity::default(), Verbosity::Silent);
    }

    #[test]
    fn verbosity_serde_names() {
        let v: Verbosity = serde_json::from_str("\"info\"").unwrap();
        assert_eq!(v, Verbosity::Info);
        assert_eq!(serde_json::to_string(&Verbosity::Debug).unwrap(), "\"debug\"");
    }

    #[test]
    fn silent_logger_runs_without_subscriber() {
        let mut logger = TrainingLogger::new(Verbosity::Silent);
        logger.start_training("test", 3, 10);
        logger.log_iteration(0, 1.0);
        logger.log_divergence(1);
        logger.finish_training(None);
    }
}
