//! Tree node representation.
//!
//! A node is either an internal split on one feature or a leaf carrying a raw
//! (unscaled) output value. The owning [`Tree`](crate::tree::Tree) applies its
//! cumulative shrinkage on top of the raw value.

use crate::core::types::{DataSize, FeatureIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tree node supporting both internal and leaf nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Split node: `value <= threshold` goes left, NaN follows `default_left`.
    Internal {
        /// Split feature index
        feature: FeatureIndex,
        /// Split threshold value
        threshold: f64,
        /// Direction taken by missing values
        default_left: bool,
        /// Split gain (improvement in loss function)
        gain: f64,
        /// Left child node index
        left: NodeIndex,
        /// Right child node index
        right: NodeIndex,
        /// Node depth in the tree
        depth: usize,
    },
    /// Leaf node with its raw output value.
    Leaf {
        /// Unscaled leaf output
        value: f64,
        /// Number of training data points that reached this leaf
        data_count: DataSize,
        /// Node depth in the tree
        depth: usize,
    },
}

impl TreeNode {
    /// Creates a new leaf node.
    pub fn leaf(value: f64, data_count: DataSize, depth: usize) -> Self {
        TreeNode::Leaf {
            value,
            data_count,
            depth,
        }
    }

    /// Returns true if this node is a leaf node.
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    /// Node depth in the tree.
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Internal { depth, .. } | TreeNode::Leaf { depth, .. } => *depth,
        }
    }

    /// Raw leaf output (leaves only).
    pub fn raw_value(&self) -> Option<f64> {
        match self {
            TreeNode::Leaf { value, .. } => Some(*value),
            TreeNode::Internal { .. } => None,
        }
    }

    /// Split gain (zero for leaves).
    pub fn split_gain(&self) -> f64 {
        match self {
            TreeNode::Internal { gain, .. } => *gain,
            TreeNode::Leaf { .. } => 0.0,
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeNode::Internal {
                feature,
                threshold,
                gain,
                ..
            } => write!(f, "Split(feature={}, threshold={:.6}, gain={:.6})", feature, threshold, gain),
            TreeNode::Leaf {
                value, data_count, ..
            } => write!(f, "Leaf(value={:.6}, count={})", value, data_count),
        }
    }
}
