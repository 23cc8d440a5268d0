//! Weight bookkeeping for dropped trees.
//!
//! With `k` rounds dropped and base learning rate `lr`:
//!
//! | mode       | new tree shrinkage         | dropped tree final weight |
//! |------------|----------------------------|---------------------------|
//! | `Standard` | `lr / (1 + k)`             | `k / (k + 1) * w`         |
//! | `Xgboost`  | `lr` if `k == 0`, else `lr / (lr + k)` | `k / (lr + k) * w` |
//!
//! A dropped tree first goes to `-w` in the training accumulator only. After
//! the new tree is fit it is rescaled twice: once for the validation
//! accumulators, which still hold `w`, then once more for the training
//! accumulator. Each push adds the tree's scale at the moment of the call, so
//! the validation push must come first.

use crate::boosting::score_updater::ScoreAccumulator;
use crate::tree::Tree;
use serde::{Deserialize, Serialize};

/// Renormalization regime for dropped trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationMode {
    /// New tree at `lr / (1 + k)`, dropped trees at `k / (k + 1)`
    Standard,
    /// XGBoost-style: new tree at `lr / (lr + k)`, dropped trees at `k / (lr + k)`
    Xgboost,
}

impl Default for NormalizationMode {
    fn default() -> Self {
        NormalizationMode::Standard
    }
}

impl NormalizationMode {
    /// Shrinkage applied to the tree fit in a round with `num_dropped` drops.
    pub fn shrinkage_rate(self, learning_rate: f64, num_dropped: usize) -> f64 {
        let k = num_dropped as f64;
        match self {
            NormalizationMode::Standard => learning_rate / (1.0 + k),
            NormalizationMode::Xgboost if num_dropped == 0 => learning_rate,
            NormalizationMode::Xgboost => learning_rate / (learning_rate + k),
        }
    }

    /// Factor a dropped tree's weight ends the round multiplied by.
    pub fn dropped_weight_factor(self, learning_rate: f64, num_dropped: usize) -> f64 {
        let k = num_dropped as f64;
        match self {
            NormalizationMode::Standard => k / (k + 1.0),
            NormalizationMode::Xgboost => k / (learning_rate + k),
        }
    }
}

/// Removes the trees of every round in `drop_index` from `train`.
///
/// Each tree is negated and its new contribution pushed, cancelling what
/// `train` held for it.
pub fn drop_trees<A: ScoreAccumulator>(
    models: &mut [Tree],
    num_class: usize,
    drop_index: &[usize],
    train: &mut A,
) {
    negate_and_push(models, num_class, drop_index, train);
}

/// Undoes [`drop_trees`] for rounds that will not be renormalized.
pub fn restore_trees<A: ScoreAccumulator>(
    models: &mut [Tree],
    num_class: usize,
    drop_index: &[usize],
    train: &mut A,
) {
    negate_and_push(models, num_class, drop_index, train);
}

fn negate_and_push<A: ScoreAccumulator>(
    models: &mut [Tree],
    num_class: usize,
    drop_index: &[usize],
    train: &mut A,
) {
    for &round in drop_index {
        for class in 0..num_class {
            let tree = &mut models[round * num_class + class];
            tree.shrink(-1.0);
            train.add_score(tree, class);
        }
    }
}

/// Settles the dropped trees at their final weight in every accumulator.
///
/// Expects each dropped tree at `-w` with `train` excluding it and every
/// `valid` accumulator still including it at `w`. No-op when nothing was
/// dropped.
#[allow(clippy::too_many_arguments)]
pub fn normalize<A: ScoreAccumulator>(
    models: &mut [Tree],
    num_class: usize,
    drop_index: &[usize],
    mode: NormalizationMode,
    shrinkage_rate: f64,
    learning_rate: f64,
    train: &mut A,
    valid: &mut [A],
) {
    let k = drop_index.len() as f64;
    let (valid_factor, train_factor) = match mode {
        NormalizationMode::Standard => (1.0 / (k + 1.0), -k),
        NormalizationMode::Xgboost => (shrinkage_rate, -k / learning_rate),
    };

    for &round in drop_index {
        for class in 0..num_class {
            let tree = &mut models[round * num_class + class];
            tree.shrink(valid_factor);
            for updater in valid.iter_mut() {
                updater.add_score(tree, class);
            }
            tree.shrink(train_factor);
            train.add_score(tree, class);
        }
    }
}
