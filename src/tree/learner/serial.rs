//! Serial tree learner.
//!
//! Grows trees leaf-wise: the leaf whose best split has the highest gain is
//! split next, until `max_leaves` is reached or no leaf has a split with
//! positive gain. Split search is exact over the sorted raw feature values,
//! parallelised across features with rayon.

use crate::config::Config;
use crate::core::constants::K_EPSILON;
use crate::core::types::{DataSize, FeatureIndex, NodeIndex, Score};
use crate::tree::learner::TreeLearner;
use crate::tree::tree::Tree;
use anyhow::{bail, Result};
use ndarray::ArrayView2;
use rayon::prelude::*;
use std::cmp::Ordering;

const K_SPLIT_GAIN_TOLERANCE: f64 = 1e-10;

/// Configuration for the serial tree learner.
#[derive(Debug, Clone)]
pub struct SerialTreeLearnerConfig {
    /// Maximum number of leaves in the tree
    pub max_leaves: usize,
    /// Maximum tree depth (<= 0 for unlimited)
    pub max_depth: i32,
    /// Minimum number of data points required in each leaf
    pub min_data_in_leaf: DataSize,
    /// Minimum sum of hessians required in each leaf
    pub min_sum_hessian_in_leaf: f64,
    /// L2 regularization parameter
    pub lambda_l2: f64,
    /// Minimum gain required for a split
    pub min_gain_to_split: f64,
}

impl Default for SerialTreeLearnerConfig {
    fn default() -> Self {
        SerialTreeLearnerConfig {
            max_leaves: 31,
            max_depth: -1,
            min_data_in_leaf: 20,
            min_sum_hessian_in_leaf: 1e-3,
            lambda_l2: 0.0,
            min_gain_to_split: 0.0,
        }
    }
}

impl SerialTreeLearnerConfig {
    /// Derive the learner settings from the training configuration.
    pub fn from_config(config: &Config) -> Self {
        SerialTreeLearnerConfig {
            max_leaves: config.num_leaves,
            max_depth: config.max_depth,
            min_data_in_leaf: config.min_data_in_leaf,
            min_sum_hessian_in_leaf: config.min_sum_hessian_in_leaf,
            lambda_l2: config.lambda_l2,
            min_gain_to_split: config.min_gain_to_split,
        }
    }
}

/// Gradient statistics of the data in one leaf.
#[derive(Debug, Clone, Copy, Default)]
struct LeafStats {
    sum_gradients: f64,
    sum_hessians: f64,
    count: DataSize,
}

/// Best split found for one leaf.
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    node: NodeIndex,
    depth: usize,
    feature: FeatureIndex,
    threshold: f64,
    gain: f64,
    left: LeafStats,
    right: LeafStats,
}

/// Leaf-wise tree learner with exact split search.
#[derive(Debug, Clone)]
pub struct SerialTreeLearner {
    config: SerialTreeLearnerConfig,
    /// Per feature, row indices with non-missing values in ascending value order
    sorted_indices: Vec<Vec<usize>>,
    num_data: DataSize,
}

impl SerialTreeLearner {
    /// Creates a learner for `features`, presorting every feature column.
    pub fn new(config: SerialTreeLearnerConfig, features: &ArrayView2<'_, f32>) -> Result<Self> {
        if config.max_leaves < 2 {
            bail!("max_leaves must be at least 2, got {}", config.max_leaves);
        }
        if config.min_data_in_leaf < 1 {
            bail!("min_data_in_leaf must be at least 1");
        }

        let sorted_indices = (0..features.ncols())
            .into_par_iter()
            .map(|feature| {
                let column = features.column(feature);
                let mut rows: Vec<usize> = (0..features.nrows())
                    .filter(|&i| !column[i].is_nan())
                    .collect();
                rows.sort_by(|&a, &b| {
                    column[a]
                        .partial_cmp(&column[b])
                        .unwrap_or(Ordering::Equal)
                        .then(a.cmp(&b))
                });
                rows
            })
            .collect();

        Ok(SerialTreeLearner {
            config,
            sorted_indices,
            num_data: features.nrows(),
        })
    }

    /// Learner configuration.
    pub fn config(&self) -> &SerialTreeLearnerConfig {
        &self.config
    }

    fn leaf_value(&self, stats: &LeafStats) -> f64 {
        -stats.sum_gradients / (stats.sum_hessians + self.config.lambda_l2 + K_EPSILON)
    }

    fn leaf_gain(&self, sum_gradients: f64, sum_hessians: f64) -> f64 {
        sum_gradients * sum_gradients / (sum_hessians + self.config.lambda_l2 + K_EPSILON)
    }

    #[allow(clippy::too_many_arguments)]
    fn find_best_split(
        &self,
        features: &ArrayView2<'_, f32>,
        gradients: &[Score],
        hessians: &[Score],
        leaf_of: &[NodeIndex],
        node: NodeIndex,
        depth: usize,
        stats: LeafStats,
    ) -> Option<SplitCandidate> {
        if self.config.max_depth > 0 && depth >= self.config.max_depth as usize {
            return None;
        }
        if stats.count < 2 * self.config.min_data_in_leaf {
            return None;
        }

        let parent_gain = self.leaf_gain(stats.sum_gradients, stats.sum_hessians);
        let min_data = self.config.min_data_in_leaf;
        let min_hessian = self.config.min_sum_hessian_in_leaf;

        (0..features.ncols())
            .into_par_iter()
            .filter_map(|feature| {
                let column = features.column(feature);
                let rows: Vec<usize> = self.sorted_indices[feature]
                    .iter()
                    .copied()
                    .filter(|&i| leaf_of[i] == node)
                    .collect();

                let mut best: Option<SplitCandidate> = None;
                let mut left = LeafStats::default();
                for j in 0..rows.len().saturating_sub(1) {
                    let row = rows[j];
                    left.sum_gradients += gradients[row];
                    left.sum_hessians += hessians[row];
                    left.count += 1;

                    let value = column[row];
                    let next_value = column[rows[j + 1]];
                    if value == next_value {
                        continue;
                    }

                    // Missing values stay in the right child.
                    let right = LeafStats {
                        sum_gradients: stats.sum_gradients - left.sum_gradients,
                        sum_hessians: stats.sum_hessians - left.sum_hessians,
                        count: stats.count - left.count,
                    };
                    if left.count < min_data || right.count < min_data {
                        continue;
                    }
                    if left.sum_hessians < min_hessian || right.sum_hessians < min_hessian {
                        continue;
                    }

                    let gain = self.leaf_gain(left.sum_gradients, left.sum_hessians)
                        + self.leaf_gain(right.sum_gradients, right.sum_hessians)
                        - parent_gain;
                    if best.map_or(true, |b| gain > b.gain) {
                        best = Some(SplitCandidate {
                            node,
                            depth,
                            feature,
                            threshold: (f64::from(value) + f64::from(next_value)) / 2.0,
                            gain,
                            left,
                            right,
                        });
                    }
                }
                best
            })
            .filter(|candidate| {
                // Gains within rounding noise of zero are not splits.
                let noise = K_SPLIT_GAIN_TOLERANCE * (1.0 + parent_gain.abs());
                candidate.gain > self.config.min_gain_to_split && candidate.gain > noise
            })
            .max_by(compare_candidates)
    }
}

/// Orders by gain, preferring the lower feature index on ties.
fn compare_candidates(a: &SplitCandidate, b: &SplitCandidate) -> Ordering {
    a.gain
        .partial_cmp(&b.gain)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.feature.cmp(&a.feature))
}

impl TreeLearner for SerialTreeLearner {
    fn train(
        &self,
        features: &ArrayView2<'_, f32>,
        gradients: &[Score],
        hessians: &[Score],
    ) -> Result<Tree> {
        let num_data = features.nrows();
        if num_data != self.num_data || features.ncols() != self.sorted_indices.len() {
            bail!(
                "Learner was built for {}x{} data, got {}x{}",
                self.num_data,
                self.sorted_indices.len(),
                num_data,
                features.ncols()
            );
        }
        if gradients.len() != num_data || hessians.len() != num_data {
            bail!(
                "Expected {} gradients and hessians, got {} and {}",
                num_data,
                gradients.len(),
                hessians.len()
            );
        }

        let root = LeafStats {
            sum_gradients: gradients.iter().sum(),
            sum_hessians: hessians.iter().sum(),
            count: num_data,
        };
        let mut tree = Tree::new(self.leaf_value(&root), num_data);
        let mut leaf_of: Vec<NodeIndex> = vec![0; num_data];

        let mut candidates: Vec<SplitCandidate> = self
            .find_best_split(features, gradients, hessians, &leaf_of, 0, 0, root)
            .into_iter()
            .collect();

        while tree.num_leaves() < self.config.max_leaves {
            let best = candidates
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| compare_candidates(a, b))
                .map(|(pos, _)| pos);
            let Some(pos) = best else { break };
            let split = candidates.swap_remove(pos);

            let (left, right) = tree.split_leaf(
                split.node,
                split.feature,
                split.threshold,
                false,
                split.gain,
                (self.leaf_value(&split.left), split.left.count),
                (self.leaf_value(&split.right), split.right.count),
            )?;

            let column = features.column(split.feature);
            for (i, leaf) in leaf_of.iter_mut().enumerate() {
                if *leaf == split.node {
                    let value = f64::from(column[i]);
                    *leaf = if !value.is_nan() && value <= split.threshold {
                        left
                    } else {
                        right
                    };
                }
            }

            for (child, stats) in [(left, split.left), (right, split.right)] {
                if let Some(candidate) = self.find_best_split(
                    features,
                    gradients,
                    hessians,
                    &leaf_of,
                    child,
                    split.depth + 1,
                    stats,
                ) {
                    candidates.push(candidate);
                }
            }
        }

        log::debug!(
            "Trained tree with {} leaves, depth {}",
            tree.num_leaves(),
            tree.depth()
        );
        Ok(tree)
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}
