//! Boosting algorithms.
//!
//! [`GBDT`] is the base trainer; [`DART`] wraps it with tree dropout. Both
//! implement [`Boosting`], and [`create_boosting`] picks one from the
//! configured [`BoostingType`].

pub mod dart;
pub mod early_stopping;
pub mod gbdt;
pub mod metric;
pub mod model;
pub mod objective;
pub mod score_updater;

pub use dart::{DartParams, DropSelector, NormalizationMode, RoundPhase, RoundSummary, DART};
pub use early_stopping::{EarlyStopping, EarlyStoppingConfig};
pub use gbdt::{EnsembleParts, GBDT};
pub use metric::Metric;
pub use model::Model;
pub use objective::ObjectiveFunction;
pub use score_updater::{ScoreAccumulator, ScoreUpdater};

use crate::config::Config;
use crate::core::error::Result;
use crate::core::types::{BoostingType, IterationIndex, Score};
use crate::dataset::Dataset;
use crate::tree::Tree;
use ndarray::{Array2, ArrayView2};
use std::fmt::Debug;

/// A boosting algorithm driven one round at a time.
pub trait Boosting: Send + Debug {
    /// Algorithm name.
    fn name(&self) -> &'static str;

    /// Training configuration.
    fn config(&self) -> &Config;

    /// Registers a validation set scored by every existing and future tree.
    fn add_valid_dataset(&mut self, data: Dataset) -> Result<()>;

    /// Swaps in a new training set, keeping every tree at its current weight.
    fn reset_training_data(&mut self, data: Dataset) -> Result<()>;

    /// Runs one round, optionally with caller-supplied gradients and
    /// hessians (class-major, `num_data * num_class` long).
    ///
    /// Returns whether training should stop.
    fn train_one_iter(
        &mut self,
        gradients: Option<(&[Score], &[Score])>,
        is_eval: bool,
    ) -> Result<bool>;

    /// Training score buffer as seen by the current round.
    fn training_score(&mut self) -> &[Score];

    /// Trees built so far, round-major.
    fn models(&self) -> &[Tree];

    /// Trees per round.
    fn num_class(&self) -> usize;

    /// Number of completed rounds.
    fn current_iteration(&self) -> IterationIndex;

    /// Raw scores (`num_rows x num_class`) from the first `num_iteration` rounds.
    fn predict_raw(
        &self,
        features: &ArrayView2<'_, f32>,
        num_iteration: Option<usize>,
    ) -> Result<Array2<Score>>;

    /// Snapshot of the ensemble in its current weighted form.
    fn to_model(&self) -> Model;

    /// Runs rounds until `num_iterations` is reached or a round asks to stop.
    ///
    /// Returns the number of completed rounds.
    fn train(&mut self) -> Result<IterationIndex> {
        let num_iterations = self.config().num_iterations;
        log::info!("Training {} for up to {} rounds", self.name(), num_iterations);
        while self.current_iteration() < num_iterations {
            if self.train_one_iter(None, true)? {
                break;
            }
        }
        log::info!(
            "Finished training {} after {} rounds",
            self.name(),
            self.current_iteration()
        );
        Ok(self.current_iteration())
    }
}

impl Boosting for GBDT {
    fn name(&self) -> &'static str {
        "gbdt"
    }

    fn config(&self) -> &Config {
        GBDT::config(self)
    }

    fn add_valid_dataset(&mut self, data: Dataset) -> Result<()> {
        GBDT::add_valid_dataset(self, data)
    }

    fn reset_training_data(&mut self, data: Dataset) -> Result<()> {
        GBDT::reset_training_data(self, data)
    }

    fn train_one_iter(
        &mut self,
        gradients: Option<(&[Score], &[Score])>,
        is_eval: bool,
    ) -> Result<bool> {
        let learning_rate = GBDT::config(self).learning_rate;
        if self.fit_iteration(gradients, learning_rate)? {
            return Ok(true);
        }
        if is_eval {
            return Ok(self.eval_and_check_early_stopping());
        }
        Ok(false)
    }

    fn training_score(&mut self) -> &[Score] {
        GBDT::training_score(self)
    }

    fn models(&self) -> &[Tree] {
        GBDT::models(self)
    }

    fn num_class(&self) -> usize {
        GBDT::num_class(self)
    }

    fn current_iteration(&self) -> IterationIndex {
        GBDT::current_iteration(self)
    }

    fn predict_raw(
        &self,
        features: &ArrayView2<'_, f32>,
        num_iteration: Option<usize>,
    ) -> Result<Array2<Score>> {
        GBDT::predict_raw(self, features, num_iteration)
    }

    fn to_model(&self) -> Model {
        GBDT::to_model(self)
    }
}

/// Creates the booster selected by `config.boosting_type`.
pub fn create_boosting(config: Config, train_data: Dataset) -> Result<Box<dyn Boosting>> {
    match config.boosting_type {
        BoostingType::GBDT => Ok(Box::new(GBDT::new(config, train_data)?)),
        BoostingType::DART => Ok(Box::new(DART::new(config, train_data)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use ndarray::{Array1, Array2};

    fn data() -> Dataset {
        let features = Array2::from_shape_fn((40, 1), |(i, _)| i as f32);
        let labels = Array1::from_shape_fn(40, |i| (i / 10) as f32);
        Dataset::new(features, labels, None).unwrap()
    }

    #[test]
    fn test_create_boosting_by_type() {
        let config = ConfigBuilder::new()
            .boosting_type(BoostingType::GBDT)
            .build()
            .unwrap();
        assert_eq!(create_boosting(config, data()).unwrap().name(), "gbdt");

        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(create_boosting(config, data()).unwrap().name(), "dart");
    }

    #[test]
    fn test_train_runs_configured_rounds() {
        let config = ConfigBuilder::new()
            .num_iterations(5)
            .num_leaves(4)
            .min_data_in_leaf(5)
            .build()
            .unwrap();
        let mut booster = create_boosting(config, data()).unwrap();
        assert_eq!(booster.train().unwrap(), 5);
        assert_eq!(booster.models().len(), 5);
        assert_eq!(booster.training_score().len(), 40);
    }
}
