//! Decision tree implementation.
//!
//! Nodes are stored in a contiguous vector (index 0 is the root). Leaf values
//! are kept unscaled; the tree carries a cumulative `shrinkage` factor that
//! every prediction is multiplied by. Rescaling a tree is therefore a single
//! multiplication that composes with all earlier rescalings, which is what the
//! dropout bookkeeping relies on.

use crate::core::types::{DataSize, FeatureIndex, NodeIndex, Score};
use crate::tree::node::TreeNode;
use anyhow::{bail, Result};
use ndarray::{ArrayView1, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Regression tree used as the weak learner of the ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Vector of tree nodes (index 0 is always the root)
    nodes: Vec<TreeNode>,
    /// Current number of leaf nodes
    num_leaves: usize,
    /// Cumulative multiplier applied to every leaf output
    shrinkage: f64,
    /// Maximum depth of any node
    max_depth: usize,
}

impl Tree {
    /// Creates a tree consisting of a single leaf.
    pub fn new(root_value: f64, data_count: DataSize) -> Self {
        Tree {
            nodes: vec![TreeNode::leaf(root_value, data_count, 0)],
            num_leaves: 1,
            shrinkage: 1.0,
            max_depth: 0,
        }
    }

    /// Returns the number of nodes in the tree.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of leaf nodes in the tree.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Returns the tree depth.
    pub fn depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the cumulative shrinkage factor.
    pub fn shrinkage(&self) -> f64 {
        self.shrinkage
    }

    /// Multiplies every leaf output by `rate`, composing with any previous
    /// rescaling, and returns the new cumulative factor.
    pub fn shrink(&mut self, rate: f64) -> f64 {
        self.shrinkage *= rate;
        self.shrinkage
    }

    /// Returns a reference to the node at the given index.
    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    /// Scaled output of the leaf at `node_index`.
    pub fn leaf_output(&self, node_index: NodeIndex) -> Option<f64> {
        self.nodes
            .get(node_index)
            .and_then(TreeNode::raw_value)
            .map(|v| v * self.shrinkage)
    }

    /// Largest feature index referenced by a split, if any.
    pub fn max_feature_index(&self) -> Option<FeatureIndex> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                TreeNode::Internal { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }

    /// Leaf index reached by a single data point.
    pub fn predict_leaf_index(&self, features: &ArrayView1<'_, f32>) -> NodeIndex {
        let mut node_index = 0;
        loop {
            match &self.nodes[node_index] {
                TreeNode::Leaf { .. } => return node_index,
                TreeNode::Internal {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                    ..
                } => {
                    let value = f64::from(features[*feature]);
                    let go_left = if value.is_nan() {
                        *default_left
                    } else {
                        value <= *threshold
                    };
                    node_index = if go_left { *left } else { *right };
                }
            }
        }
    }

    /// Scaled output for a single data point.
    pub fn predict(&self, features: &ArrayView1<'_, f32>) -> Score {
        let leaf = self.predict_leaf_index(features);
        self.nodes[leaf].raw_value().unwrap_or(0.0) * self.shrinkage
    }

    /// Adds this tree's current scaled output for every row of `features`
    /// into `scores` (one slot per row).
    pub fn add_prediction_to_score(&self, features: &ArrayView2<'_, f32>, scores: &mut [Score]) {
        debug_assert_eq!(features.nrows(), scores.len());
        scores.par_iter_mut().enumerate().for_each(|(i, score)| {
            *score += self.predict(&features.row(i));
        });
    }

    /// Splits a leaf into an internal node with two new leaves.
    #[allow(clippy::too_many_arguments)]
    pub fn split_leaf(
        &mut self,
        node_index: NodeIndex,
        feature: FeatureIndex,
        threshold: f64,
        default_left: bool,
        gain: f64,
        left_leaf: (f64, DataSize),
        right_leaf: (f64, DataSize),
    ) -> Result<(NodeIndex, NodeIndex)> {
        let depth = match self.nodes.get(node_index) {
            None => bail!("Node index {} out of bounds", node_index),
            Some(TreeNode::Internal { .. }) => bail!("Cannot split non-leaf node {}", node_index),
            Some(TreeNode::Leaf { depth, .. }) => *depth,
        };

        let left = self.nodes.len();
        let right = left + 1;
        let child_depth = depth + 1;
        self.nodes.push(TreeNode::leaf(left_leaf.0, left_leaf.1, child_depth));
        self.nodes.push(TreeNode::leaf(right_leaf.0, right_leaf.1, child_depth));
        self.nodes[node_index] = TreeNode::Internal {
            feature,
            threshold,
            default_left,
            gain,
            left,
            right,
            depth,
        };

        self.num_leaves += 1;
        self.max_depth = self.max_depth.max(child_depth);
        Ok((left, right))
    }

    /// Returns all leaf node indices.
    pub fn leaf_indices(&self) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| if node.is_leaf() { Some(i) } else { None })
            .collect()
    }

    /// Validates the tree structure consistency.
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            bail!("Tree has no nodes");
        }

        let mut referenced = vec![false; self.nodes.len()];
        let mut leaf_count = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { value, .. } => {
                    leaf_count += 1;
                    if !value.is_finite() {
                        bail!("Leaf {} has non-finite output", i);
                    }
                }
                TreeNode::Internal { left, right, .. } => {
                    for &child in &[*left, *right] {
                        if child >= self.nodes.len() || child <= i {
                            bail!("Node {} has invalid child index {}", i, child);
                        }
                        if referenced[child] {
                            bail!("Node {} is referenced twice", child);
                        }
                        referenced[child] = true;
                    }
                }
            }
        }

        if referenced[0] {
            bail!("Root node is referenced as a child");
        }

        if leaf_count != self.num_leaves {
            bail!(
                "Leaf count mismatch: expected {}, found {}",
                self.num_leaves,
                leaf_count
            );
        }

        Ok(())
    }

    /// Converts the tree to a JSON representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Creates a tree from a JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        let tree: Tree = serde_json::from_str(json)?;
        tree.validate()?;
        Ok(tree)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tree(nodes={}, leaves={}, depth={}, shrinkage={})",
            self.num_nodes(),
            self.num_leaves(),
            self.depth(),
            self.shrinkage()
        )
    }
}
