//! Evaluation metrics over a score buffer.

use crate::boosting::objective::{sigmoid, softmax};
use crate::core::constants::K_MIN_PROB;
use crate::core::types::{MetricType, Score};
use crate::dataset::Dataset;
use std::fmt::Debug;

/// Metric evaluated on the raw score buffer of one dataset.
pub trait Metric: Send + Sync + Debug {
    /// Metric name used in log lines.
    fn name(&self) -> &'static str;

    /// Weighted average of the per-example loss.
    fn eval(&self, score: &[Score]) -> f64;

    /// Whether larger values are better.
    fn higher_is_better(&self) -> bool {
        false
    }
}

/// Builds `metric_type` bound to the labels and weights of `data`.
pub fn create_metric(metric_type: MetricType, data: &Dataset, num_class: usize) -> Box<dyn Metric> {
    let labels: Vec<f64> = data.labels().iter().map(|&l| f64::from(l)).collect();
    let weights: Vec<f64> = (0..data.num_data()).map(|i| data.weight(i)).collect();
    let targets = LabeledTargets { labels, weights };
    match metric_type {
        MetricType::L2 => Box::new(L2Metric { targets, root: false }),
        MetricType::RMSE => Box::new(L2Metric { targets, root: true }),
        MetricType::BinaryLogloss => Box::new(BinaryLoglossMetric { targets }),
        MetricType::MultiLogloss => Box::new(MultiLoglossMetric { targets, num_class }),
    }
}

#[derive(Debug, Clone)]
struct LabeledTargets {
    labels: Vec<f64>,
    weights: Vec<f64>,
}

impl LabeledTargets {
    fn weighted_mean<F: Fn(usize) -> f64>(&self, loss: F) -> f64 {
        let mut sum_loss = 0.0;
        let mut sum_weights = 0.0;
        for (i, &w) in self.weights.iter().enumerate() {
            sum_loss += loss(i) * w;
            sum_weights += w;
        }
        if sum_weights > 0.0 {
            sum_loss / sum_weights
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
struct L2Metric {
    targets: LabeledTargets,
    root: bool,
}

impl Metric for L2Metric {
    fn name(&self) -> &'static str {
        if self.root {
            "rmse"
        } else {
            "l2"
        }
    }

    fn eval(&self, score: &[Score]) -> f64 {
        let mse = self.targets.weighted_mean(|i| {
            let diff = score[i] - self.targets.labels[i];
            diff * diff
        });
        if self.root {
            mse.sqrt()
        } else {
            mse
        }
    }
}

#[derive(Debug, Clone)]
struct BinaryLoglossMetric {
    targets: LabeledTargets,
}

impl Metric for BinaryLoglossMetric {
    fn name(&self) -> &'static str {
        "binary_logloss"
    }

    fn eval(&self, score: &[Score]) -> f64 {
        self.targets.weighted_mean(|i| {
            let p = sigmoid(score[i]).clamp(K_MIN_PROB, 1.0 - K_MIN_PROB);
            if self.targets.labels[i] > 0.5 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
    }
}

#[derive(Debug, Clone)]
struct MultiLoglossMetric {
    targets: LabeledTargets,
    num_class: usize,
}

impl Metric for MultiLoglossMetric {
    fn name(&self) -> &'static str {
        "multi_logloss"
    }

    fn eval(&self, score: &[Score]) -> f64 {
        let n = self.targets.labels.len();
        self.targets.weighted_mean(|i| {
            let row: Vec<f64> = (0..self.num_class).map(|c| score[c * n + i]).collect();
            let probs = softmax(&row);
            let label = self.targets.labels[i] as usize;
            -probs[label].max(K_MIN_PROB).ln()
        })
    }
}
