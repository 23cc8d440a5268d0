//! Tree learning algorithms.

pub mod serial;

pub use serial::{SerialTreeLearner, SerialTreeLearnerConfig};

use crate::core::types::Score;
use crate::tree::Tree;
use ndarray::ArrayView2;
use std::fmt::Debug;

/// Fits one regression tree to a gradient/hessian signal.
pub trait TreeLearner: Send + Sync + Debug {
    /// Train a tree on `features` for one class's gradients and hessians.
    ///
    /// The returned tree has unit shrinkage.
    fn train(
        &self,
        features: &ArrayView2<'_, f32>,
        gradients: &[Score],
        hessians: &[Score],
    ) -> anyhow::Result<Tree>;

    /// Name of the learner for diagnostics.
    fn name(&self) -> &'static str;
}
