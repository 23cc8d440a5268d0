//! Early stopping on validation metrics.
//!
//! One tracker watches one (validation set, metric) pair. Training stops as
//! soon as any tracker has gone `patience` evaluations without improving by
//! more than `min_delta`.

use crate::core::types::IterationIndex;

/// Configuration for early stopping behavior.
#[derive(Debug, Clone)]
pub struct EarlyStoppingConfig {
    /// Number of evaluations to wait for improvement before stopping
    pub patience: usize,
    /// Minimum improvement required to reset the patience counter
    pub min_delta: f64,
    /// Whether lower metric values are better
    pub minimize: bool,
}

impl Default for EarlyStoppingConfig {
    fn default() -> Self {
        EarlyStoppingConfig {
            patience: 10,
            min_delta: 0.0,
            minimize: true,
        }
    }
}

/// Tracks one metric and decides when to stop training.
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    config: EarlyStoppingConfig,
    best: Option<(f64, IterationIndex)>,
    rounds_without_improvement: usize,
    stopped: bool,
}

impl EarlyStopping {
    /// Creates a monitor that has seen no metric yet.
    pub fn new(config: EarlyStoppingConfig) -> Self {
        EarlyStopping {
            config,
            best: None,
            rounds_without_improvement: 0,
            stopped: false,
        }
    }

    /// Records the metric observed after `iteration` and returns whether to stop.
    pub fn update(&mut self, metric: f64, iteration: IterationIndex) -> bool {
        if self.stopped {
            return true;
        }

        let improved = match self.best {
            None => true,
            Some((best, _)) => {
                let gain = if self.config.minimize {
                    best - metric
                } else {
                    metric - best
                };
                gain > self.config.min_delta
            }
        };

        if improved {
            self.best = Some((metric, iteration));
            self.rounds_without_improvement = 0;
        } else {
            self.rounds_without_improvement += 1;
        }

        if self.rounds_without_improvement >= self.config.patience {
            self.stopped = true;
            log::info!(
                "Early stopping triggered at iteration {} (best was {} at iteration {})",
                iteration,
                self.best_metric(),
                self.best_iteration()
            );
        }
        self.stopped
    }

    /// Returns true if early stopping has been triggered.
    pub fn should_stop(&self) -> bool {
        self.stopped
    }

    /// Best metric value observed so far (infinite before the first update).
    pub fn best_metric(&self) -> f64 {
        match self.best {
            Some((metric, _)) => metric,
            None if self.config.minimize => f64::INFINITY,
            None => f64::NEG_INFINITY,
        }
    }

    /// Iteration where the best metric was observed (0 before the first update).
    pub fn best_iteration(&self) -> IterationIndex {
        self.best.map_or(0, |(_, iteration)| iteration)
    }

    /// Evaluations since the last improvement.
    pub fn patience_counter(&self) -> usize {
        self.rounds_without_improvement
    }
}
