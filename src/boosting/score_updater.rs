//! Running per-example, per-class score sums.
//!
//! Every dataset the booster tracks (the training set and each validation
//! set) owns one accumulator. The buffer is class-major:
//! `score[class * num_data + i]`.

use crate::core::types::{DataSize, Score};
use crate::dataset::Dataset;
use crate::tree::Tree;

/// Accumulates the current weighted output of trees over one dataset.
pub trait ScoreAccumulator: Send {
    /// Adds `tree`'s current scaled output for `class` to every example.
    fn add_score(&mut self, tree: &Tree, class: usize);

    /// Full score buffer, `num_data * num_class` long.
    fn score(&self) -> &[Score];

    /// Number of examples.
    fn num_data(&self) -> DataSize;

    /// Number of classes.
    fn num_class(&self) -> usize;

    /// Score slice of one class.
    fn class_score(&self, class: usize) -> &[Score] {
        let n = self.num_data();
        &self.score()[class * n..(class + 1) * n]
    }
}

/// Score accumulator backed by an owned dataset.
#[derive(Debug, Clone)]
pub struct ScoreUpdater {
    data: Dataset,
    score: Vec<Score>,
    num_class: usize,
}

impl ScoreUpdater {
    /// Creates a zero-initialised accumulator over `data`.
    pub fn new(data: Dataset, num_class: usize) -> Self {
        let score = vec![0.0; data.num_data() * num_class];
        ScoreUpdater {
            data,
            score,
            num_class,
        }
    }

    /// Dataset this accumulator scores.
    pub fn data(&self) -> &Dataset {
        &self.data
    }
}

impl ScoreAccumulator for ScoreUpdater {
    fn add_score(&mut self, tree: &Tree, class: usize) {
        let n = self.data.num_data();
        let slot = &mut self.score[class * n..(class + 1) * n];
        tree.add_prediction_to_score(&self.data.features(), slot);
    }

    fn score(&self) -> &[Score] {
        &self.score
    }

    fn num_data(&self) -> DataSize {
        self.data.num_data()
    }

    fn num_class(&self) -> usize {
        self.num_class
    }
}
