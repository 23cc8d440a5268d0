//! DART: dropouts meet multiple additive regression trees.
//!
//! Each round temporarily removes a random subset of earlier rounds from the
//! training score, fits the new trees against that reduced ensemble, then
//! scales the dropped trees so the training and validation accumulators again
//! equal the sum of every tree's current weighted output.
//!
//! A round is an explicit protocol on [`DART`]:
//!
//! 1. [`DART::begin_round`] clears the drop set (called for you by the
//!    constructor and by [`DART::end_round`]).
//! 2. [`DART::ensure_dropped`] draws the drop set and removes those trees
//!    from the training score. It runs at most once per round; reading the
//!    training score calls it.
//! 3. [`DART::fit_and_renormalize`] fits one tree per class and settles the
//!    dropped trees at their final weight.
//! 4. [`DART::end_round`] records a [`RoundSummary`] and starts the next round.

pub mod drop;
pub mod normalize;

pub use drop::DropSelector;
pub use normalize::NormalizationMode;

use crate::boosting::gbdt::GBDT;
use crate::boosting::model::Model;
use crate::boosting::Boosting;
use crate::config::Config;
use crate::core::error::{LightGBMError, Result};
use crate::core::types::{IterationIndex, Score};
use crate::dataset::Dataset;
use crate::tree::Tree;
use ndarray::{Array2, ArrayView2};

/// Configuration consumed by the dropout mechanism.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DartParams {
    /// Probability that a round drops nothing
    pub skip_drop: f64,
    /// Per-round probability of dropping each earlier round
    pub drop_rate: f64,
    /// Seed of the dropout stream
    pub drop_seed: u64,
    /// Base learning rate
    pub learning_rate: f64,
    /// Renormalization regime
    pub mode: NormalizationMode,
}

/// Where the current round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// No drop has happened yet this round
    Idle,
    /// Dropped trees are removed from the training score
    Dropped,
    /// New trees are fit and the dropped trees renormalized
    Fitted,
}

/// Outcome of one completed round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSummary {
    /// Number of completed rounds after this one
    pub iteration: IterationIndex,
    /// Round indices dropped in this round
    pub dropped: Vec<usize>,
    /// Shrinkage applied to the new trees
    pub shrinkage_rate: f64,
    /// Whether training should stop after this round
    pub stopped: bool,
}

/// DART booster layered over [`GBDT`].
#[derive(Debug)]
pub struct DART {
    gbdt: GBDT,
    params: DartParams,
    selector: DropSelector,
    drop_index: Vec<usize>,
    shrinkage_rate: f64,
    phase: RoundPhase,
    round_stopped: bool,
    last_round: Option<RoundSummary>,
}

impl DART {
    /// Creates a DART booster over `train_data`.
    pub fn new(config: Config, train_data: Dataset) -> Result<Self> {
        let params = config.dart_params();
        let gbdt = GBDT::new(config, train_data)?;
        log::debug!(
            "DART with skip_drop={}, drop_rate={}, drop_seed={}, mode={:?}",
            params.skip_drop,
            params.drop_rate,
            params.drop_seed,
            params.mode
        );

        let mut dart = DART {
            gbdt,
            selector: DropSelector::new(params.skip_drop, params.drop_rate, params.drop_seed),
            drop_index: Vec::new(),
            shrinkage_rate: params.learning_rate,
            phase: RoundPhase::Idle,
            round_stopped: false,
            last_round: None,
            params,
        };
        dart.begin_round()?;
        Ok(dart)
    }

    /// Starts a round. Fails while a round is in progress.
    pub fn begin_round(&mut self) -> Result<()> {
        match self.phase {
            RoundPhase::Idle => {
                self.drop_index.clear();
                self.round_stopped = false;
                Ok(())
            }
            phase => Err(LightGBMError::round_protocol("begin a round", phase)),
        }
    }

    /// Runs the drop step unless it already ran this round.
    ///
    /// Returns whether the step ran now.
    pub fn ensure_dropped(&mut self) -> bool {
        if self.phase != RoundPhase::Idle {
            return false;
        }

        let num_rounds = self.gbdt.current_iteration();
        self.drop_index = self.selector.select(num_rounds);
        self.shrinkage_rate = self
            .params
            .mode
            .shrinkage_rate(self.params.learning_rate, self.drop_index.len());

        let drop_index = &self.drop_index;
        self.gbdt.in_pool(|gbdt| {
            let parts = gbdt.parts_mut();
            normalize::drop_trees(parts.models, parts.num_class, drop_index, parts.train_score);
        });

        self.phase = RoundPhase::Dropped;
        log::debug!(
            "Round {}: dropped {} of {} rounds, shrinkage {}",
            num_rounds + 1,
            self.drop_index.len(),
            num_rounds,
            self.shrinkage_rate
        );
        true
    }

    /// Fits this round's trees and renormalizes the dropped ones.
    ///
    /// Returns `true` when the base trainer found nothing to fit; the dropped
    /// trees are then restored unchanged.
    ///
    /// If fitting fails, the dropped trees are restored and the round goes
    /// back to [`RoundPhase::Idle`]. A retry draws a fresh drop set, so the
    /// dropout stream advances by one more selection.
    pub fn fit_and_renormalize(&mut self, gradients: Option<(&[Score], &[Score])>) -> Result<bool> {
        if self.phase == RoundPhase::Fitted {
            return Err(LightGBMError::round_protocol("fit again", self.phase));
        }
        self.ensure_dropped();

        let stop = match self.gbdt.fit_iteration(gradients, self.shrinkage_rate) {
            Ok(stop) => stop,
            Err(e) => {
                self.restore_dropped();
                return Err(e);
            }
        };

        if stop {
            self.restore_dropped();
        } else {
            let drop_index = &self.drop_index;
            let params = self.params;
            let shrinkage_rate = self.shrinkage_rate;
            self.gbdt.in_pool(|gbdt| {
                let parts = gbdt.parts_mut();
                normalize::normalize(
                    parts.models,
                    parts.num_class,
                    drop_index,
                    params.mode,
                    shrinkage_rate,
                    params.learning_rate,
                    parts.train_score,
                    parts.valid_scores,
                );
            });
        }

        self.phase = RoundPhase::Fitted;
        self.round_stopped = stop;
        Ok(stop)
    }

    fn restore_dropped(&mut self) {
        let drop_index = std::mem::take(&mut self.drop_index);
        self.gbdt.in_pool(|gbdt| {
            let parts = gbdt.parts_mut();
            normalize::restore_trees(parts.models, parts.num_class, &drop_index, parts.train_score);
        });
        self.phase = RoundPhase::Idle;
    }

    /// Closes a fitted round and begins the next one.
    pub fn end_round(&mut self) -> Result<()> {
        if self.phase != RoundPhase::Fitted {
            return Err(LightGBMError::round_protocol("end a round", self.phase));
        }
        self.last_round = Some(RoundSummary {
            iteration: self.gbdt.current_iteration(),
            dropped: self.drop_index.clone(),
            shrinkage_rate: self.shrinkage_rate,
            stopped: self.round_stopped,
        });
        self.phase = RoundPhase::Idle;
        self.begin_round()
    }

    /// Current phase of the round protocol.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Rounds dropped in the current round.
    pub fn drop_set(&self) -> &[usize] {
        &self.drop_index
    }

    /// Shrinkage for the tree of the current round.
    pub fn shrinkage_rate(&self) -> f64 {
        self.shrinkage_rate
    }

    /// Summary of the most recently completed round.
    pub fn last_round(&self) -> Option<&RoundSummary> {
        self.last_round.as_ref()
    }

    /// The drop selector, for inspecting its draw count.
    pub fn selector(&self) -> &DropSelector {
        &self.selector
    }

    /// Dropout parameters.
    pub fn params(&self) -> &DartParams {
        &self.params
    }

    /// Underlying base trainer.
    pub fn gbdt(&self) -> &GBDT {
        &self.gbdt
    }
}

impl Boosting for DART {
    fn name(&self) -> &'static str {
        "dart"
    }

    fn config(&self) -> &Config {
        self.gbdt.config()
    }

    fn add_valid_dataset(&mut self, data: Dataset) -> Result<()> {
        // Validation accumulators must see every tree at its settled weight.
        if self.phase != RoundPhase::Idle {
            return Err(LightGBMError::round_protocol("add a validation set", self.phase));
        }
        self.gbdt.add_valid_dataset(data)
    }

    fn reset_training_data(&mut self, data: Dataset) -> Result<()> {
        // The drop step has already removed trees from the old accumulator.
        if self.phase != RoundPhase::Idle {
            return Err(LightGBMError::round_protocol("reset training data", self.phase));
        }
        self.gbdt.reset_training_data(data)
    }

    fn train_one_iter(
        &mut self,
        gradients: Option<(&[Score], &[Score])>,
        is_eval: bool,
    ) -> Result<bool> {
        let mut stop = self.fit_and_renormalize(gradients)?;
        if !stop && is_eval {
            stop = self.gbdt.eval_and_check_early_stopping();
            self.round_stopped = stop;
        }
        self.end_round()?;
        Ok(stop)
    }

    fn training_score(&mut self) -> &[Score] {
        self.ensure_dropped();
        self.gbdt.training_score()
    }

    fn models(&self) -> &[Tree] {
        self.gbdt.models()
    }

    fn num_class(&self) -> usize {
        self.gbdt.num_class()
    }

    fn current_iteration(&self) -> IterationIndex {
        self.gbdt.current_iteration()
    }

    fn predict_raw(
        &self,
        features: &ArrayView2<'_, f32>,
        num_iteration: Option<usize>,
    ) -> Result<Array2<Score>> {
        self.gbdt.predict_raw(features, num_iteration)
    }

    fn to_model(&self) -> Model {
        self.gbdt.to_model()
    }
}
