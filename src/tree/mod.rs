//! Tree structures and tree learning.
//!
//! [`Tree`] is the weak learner stored in the ensemble; its cumulative
//! shrinkage is the per-tree weight that DART rescales in place.
//! [`SerialTreeLearner`] fits a new tree to one class's gradients.

pub mod learner;
pub mod node;
pub mod tree;

pub use learner::{SerialTreeLearner, SerialTreeLearnerConfig, TreeLearner};
pub use node::TreeNode;
pub use tree::Tree;
