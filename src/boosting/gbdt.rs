//! Gradient boosting base trainer.
//!
//! [`GBDT`] owns the ensemble, the training accumulator, one accumulator per
//! validation set, the objective, the metrics and the tree learner. DART
//! drives it through [`GBDT::fit_iteration`] with its own shrinkage rate and
//! mutates the ensemble through [`GBDT::parts_mut`].

use crate::boosting::early_stopping::{EarlyStopping, EarlyStoppingConfig};
use crate::boosting::metric::{create_metric, Metric};
use crate::boosting::model::{self, Model};
use crate::boosting::objective::{create_objective, ObjectiveFunction};
use crate::boosting::score_updater::{ScoreAccumulator, ScoreUpdater};
use crate::config::Config;
use crate::core::error::{LightGBMError, Result};
use crate::core::types::{IterationIndex, Score};
use crate::core::utils::threading::{build_thread_pool, run_in_pool};
use crate::dataset::Dataset;
use crate::training_error;
use crate::tree::{SerialTreeLearner, SerialTreeLearnerConfig, Tree, TreeLearner};
use ndarray::{Array2, ArrayView2};
use rayon::ThreadPool;

/// Mutable view of the ensemble and every accumulator, borrowed together.
#[derive(Debug)]
pub struct EnsembleParts<'a> {
    /// Trees, round-major
    pub models: &'a mut [Tree],
    /// Training accumulator
    pub train_score: &'a mut ScoreUpdater,
    /// Validation accumulators
    pub valid_scores: &'a mut [ScoreUpdater],
    /// Trees per round
    pub num_class: usize,
}

/// Metrics of one validation set with their early stopping trackers.
#[derive(Debug)]
struct ValidSet {
    metrics: Vec<Box<dyn Metric>>,
    trackers: Vec<EarlyStopping>,
}

/// Plain gradient boosting over [`SerialTreeLearner`] trees.
#[derive(Debug)]
pub struct GBDT {
    config: Config,
    num_class: usize,
    num_features: usize,
    objective: Box<dyn ObjectiveFunction>,
    learner: SerialTreeLearner,
    train_score: ScoreUpdater,
    training_metrics: Vec<Box<dyn Metric>>,
    valid_scores: Vec<ScoreUpdater>,
    valid_sets: Vec<ValidSet>,
    models: Vec<Tree>,
    iter: IterationIndex,
    best_iteration: Option<IterationIndex>,
    gradients: Vec<Score>,
    hessians: Vec<Score>,
    pool: Option<ThreadPool>,
}

impl GBDT {
    /// Creates a trainer over `train_data`.
    pub fn new(config: Config, train_data: Dataset) -> Result<Self> {
        config.validate()?;
        crate::core::initialize_logging(config.verbosity);
        let num_class = config.num_trees_per_iteration();
        let objective = create_objective(&config, &train_data)?;
        let learner = SerialTreeLearner::new(
            SerialTreeLearnerConfig::from_config(&config),
            &train_data.features(),
        )
        .map_err(|e| LightGBMError::tree_construction(e.to_string()))?;

        let training_metrics = create_training_metrics(&config, &train_data, num_class);
        let pool = build_thread_pool(config.num_threads)?;

        let num_features = train_data.num_features();
        let buffer_len = train_data.num_data() * num_class;
        log::info!(
            "Initialized {} booster: {} examples, {} features, {} trees per round",
            config.boosting_type,
            train_data.num_data(),
            num_features,
            num_class
        );

        Ok(GBDT {
            num_class,
            num_features,
            objective,
            learner,
            train_score: ScoreUpdater::new(train_data, num_class),
            training_metrics,
            valid_scores: Vec::new(),
            valid_sets: Vec::new(),
            models: Vec::new(),
            iter: 0,
            best_iteration: None,
            gradients: vec![0.0; buffer_len],
            hessians: vec![0.0; buffer_len],
            pool,
            config,
        })
    }

    /// Training configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Trees per round.
    pub fn num_class(&self) -> usize {
        self.num_class
    }

    /// Number of completed rounds.
    pub fn current_iteration(&self) -> IterationIndex {
        self.iter
    }

    /// Trees built so far, round-major.
    pub fn models(&self) -> &[Tree] {
        &self.models
    }

    /// Round with the best validation metric when early stopping fired.
    pub fn best_iteration(&self) -> Option<IterationIndex> {
        self.best_iteration
    }

    /// Current training score buffer.
    pub fn training_score(&self) -> &[Score] {
        self.train_score.score()
    }

    /// Current score buffer of validation set `index`.
    pub fn valid_score(&self, index: usize) -> Option<&[Score]> {
        self.valid_scores.get(index).map(|s| s.score())
    }

    /// Registers a validation set, seeding its accumulator with every
    /// existing tree at its current weight.
    pub fn add_valid_dataset(&mut self, data: Dataset) -> Result<()> {
        if data.num_features() != self.num_features {
            return Err(LightGBMError::dimension_mismatch(
                format!("{} features", self.num_features),
                format!("{} features in validation data", data.num_features()),
            ));
        }

        let metrics: Vec<Box<dyn Metric>> = self
            .config
            .effective_metrics()
            .into_iter()
            .map(|m| create_metric(m, &data, self.num_class))
            .collect();
        let trackers = match self.config.early_stopping_rounds {
            Some(patience) => metrics
                .iter()
                .map(|m| {
                    EarlyStopping::new(EarlyStoppingConfig {
                        patience,
                        min_delta: self.config.early_stopping_tolerance,
                        minimize: !m.higher_is_better(),
                    })
                })
                .collect(),
            None => Vec::new(),
        };

        let mut updater = ScoreUpdater::new(data, self.num_class);
        let num_class = self.num_class;
        let models = &self.models;
        run_in_pool(self.pool.as_ref(), || {
            for (i, tree) in models.iter().enumerate() {
                updater.add_score(tree, i % num_class);
            }
        });

        self.valid_scores.push(updater);
        self.valid_sets.push(ValidSet { metrics, trackers });
        log::debug!("Added validation set {}", self.valid_scores.len());
        Ok(())
    }

    /// Replaces the training set while keeping every tree.
    ///
    /// The new accumulator is seeded with each existing tree at its current
    /// weight. The objective, training metrics, tree learner and gradient
    /// buffers are rebuilt for the new data.
    pub fn reset_training_data(&mut self, train_data: Dataset) -> Result<()> {
        if train_data.num_features() != self.num_features {
            return Err(LightGBMError::dimension_mismatch(
                format!("{} features", self.num_features),
                format!("{} features in training data", train_data.num_features()),
            ));
        }

        let objective = create_objective(&self.config, &train_data)?;
        let learner = SerialTreeLearner::new(
            SerialTreeLearnerConfig::from_config(&self.config),
            &train_data.features(),
        )
        .map_err(|e| LightGBMError::tree_construction(e.to_string()))?;
        let training_metrics = create_training_metrics(&self.config, &train_data, self.num_class);

        let buffer_len = train_data.num_data() * self.num_class;
        let mut updater = ScoreUpdater::new(train_data, self.num_class);
        let num_class = self.num_class;
        let models = &self.models;
        run_in_pool(self.pool.as_ref(), || {
            for (i, tree) in models.iter().enumerate() {
                updater.add_score(tree, i % num_class);
            }
        });

        self.objective = objective;
        self.learner = learner;
        self.training_metrics = training_metrics;
        self.train_score = updater;
        self.gradients = vec![0.0; buffer_len];
        self.hessians = vec![0.0; buffer_len];
        log::info!(
            "Reset training data: {} examples, {} trees carried over",
            self.train_score.num_data(),
            self.models.len()
        );
        Ok(())
    }

    /// Runs `op` with the configured thread pool installed.
    pub(crate) fn in_pool<R, F>(&mut self, op: F) -> R
    where
        F: FnOnce(&mut GBDT) -> R + Send,
        R: Send,
    {
        let pool = self.pool.take();
        let result = run_in_pool(pool.as_ref(), || op(self));
        self.pool = pool;
        result
    }

    /// Borrows the ensemble together with all accumulators.
    pub fn parts_mut(&mut self) -> EnsembleParts<'_> {
        EnsembleParts {
            models: &mut self.models,
            train_score: &mut self.train_score,
            valid_scores: &mut self.valid_scores,
            num_class: self.num_class,
        }
    }

    /// Fits one tree per class and appends them scaled by `shrinkage_rate`.
    ///
    /// Gradients are computed from the current training score unless
    /// supplied. Returns `true`, appending nothing, when no class found a
    /// split.
    pub fn fit_iteration(
        &mut self,
        gradients: Option<(&[Score], &[Score])>,
        shrinkage_rate: f64,
    ) -> Result<bool> {
        self.in_pool(|gbdt| gbdt.fit_iteration_inner(gradients, shrinkage_rate))
    }

    fn fit_iteration_inner(
        &mut self,
        gradients: Option<(&[Score], &[Score])>,
        shrinkage_rate: f64,
    ) -> Result<bool> {
        let num_data = self.train_score.num_data();
        let expected = num_data * self.num_class;

        let (grad, hess): (&[Score], &[Score]) = match gradients {
            Some((g, h)) => {
                if g.len() != expected || h.len() != expected {
                    return Err(LightGBMError::dimension_mismatch(
                        format!("{} gradients and hessians", expected),
                        format!("{} gradients and {} hessians", g.len(), h.len()),
                    ));
                }
                if let Some(i) = g.iter().chain(h).position(|v| !v.is_finite()) {
                    return Err(training_error!(
                        "Custom gradient or hessian at position {} is not finite",
                        i
                    ));
                }
                (g, h)
            }
            None => {
                self.objective.get_gradients(
                    self.train_score.score(),
                    &mut self.gradients,
                    &mut self.hessians,
                );
                (&self.gradients, &self.hessians)
            }
        };

        let features = self.train_score.data().features();
        let mut new_trees = Vec::with_capacity(self.num_class);
        for class in 0..self.num_class {
            let range = class * num_data..(class + 1) * num_data;
            let tree = self
                .learner
                .train(&features, &grad[range.clone()], &hess[range])
                .map_err(|e| LightGBMError::tree_construction(e.to_string()))?;
            new_trees.push(tree);
        }

        if new_trees.iter().all(|t| t.num_leaves() <= 1) {
            log::warn!(
                "Stopped training because there are no more leaves that meet the split requirements"
            );
            return Ok(true);
        }

        for (class, mut tree) in new_trees.into_iter().enumerate() {
            tree.shrink(shrinkage_rate);
            self.train_score.add_score(&tree, class);
            for updater in &mut self.valid_scores {
                updater.add_score(&tree, class);
            }
            self.models.push(tree);
        }
        self.iter += 1;
        Ok(false)
    }

    /// Evaluates metrics and reports whether early stopping fired.
    ///
    /// Metrics are logged every `metric_freq` rounds; trackers are updated
    /// every round while early stopping is enabled.
    pub fn eval_and_check_early_stopping(&mut self) -> bool {
        let iter = self.iter;
        let freq = self.config.metric_freq;
        let need_output = freq > 0 && iter % freq == 0;
        let early_stopping = self.config.is_early_stopping_enabled();
        if !need_output && !early_stopping {
            return false;
        }

        if need_output {
            for metric in &self.training_metrics {
                log::info!(
                    "Iteration:{}, training {} : {}",
                    iter,
                    metric.name(),
                    metric.eval(self.train_score.score())
                );
            }
        }

        let mut should_stop = false;
        for (set_index, (valid_set, updater)) in self
            .valid_sets
            .iter_mut()
            .zip(self.valid_scores.iter())
            .enumerate()
        {
            for (metric_index, metric) in valid_set.metrics.iter().enumerate() {
                let value = metric.eval(updater.score());
                if need_output {
                    log::info!(
                        "Iteration:{}, valid_{} {} : {}",
                        iter,
                        set_index + 1,
                        metric.name(),
                        value
                    );
                }
                if let Some(tracker) = valid_set.trackers.get_mut(metric_index) {
                    if tracker.update(value, iter) && !should_stop {
                        should_stop = true;
                        self.best_iteration = Some(tracker.best_iteration());
                    }
                }
            }
        }

        if should_stop {
            log::info!(
                "Early stopping at iteration {}, the best iteration round is {}",
                iter,
                self.best_iteration.unwrap_or(iter)
            );
        }
        should_stop
    }

    /// Raw scores (`num_rows x num_class`) from the first `num_iteration` rounds.
    pub fn predict_raw(
        &self,
        features: &ArrayView2<'_, f32>,
        num_iteration: Option<usize>,
    ) -> Result<Array2<Score>> {
        model::predict_raw(
            &self.models,
            self.num_class,
            self.num_features,
            features,
            num_iteration,
        )
    }

    /// Snapshot of the ensemble in its current weighted form.
    pub fn to_model(&self) -> Model {
        Model {
            version: crate::core::constants::LIGHTGBM_DART_VERSION.to_string(),
            boosting_type: self.config.boosting_type,
            objective: self.config.objective,
            num_class: self.num_class,
            num_features: self.num_features,
            trees: self.models.clone(),
        }
    }
}

fn create_training_metrics(config: &Config, data: &Dataset, num_class: usize) -> Vec<Box<dyn Metric>> {
    if !config.is_training_metric {
        return Vec::new();
    }
    config
        .effective_metrics()
        .into_iter()
        .map(|m| create_metric(m, data, num_class))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::core::types::BoostingType;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2};

    fn step_data(n: usize) -> Dataset {
        let features = Array2::from_shape_fn((n, 1), |(i, _)| i as f32);
        let labels = Array1::from_shape_fn(n, |i| if i < n / 2 { 0.0 } else { 4.0 });
        Dataset::new(features, labels, None).unwrap()
    }

    fn config() -> Config {
        ConfigBuilder::new()
            .boosting_type(BoostingType::GBDT)
            .num_leaves(4)
            .min_data_in_leaf(2)
            .learning_rate(0.5)
            .build()
            .unwrap()
    }

    #[test]
    fn test_fit_iteration_updates_scores() {
        let mut gbdt = GBDT::new(config(), step_data(20)).unwrap();
        assert!(!gbdt.fit_iteration(None, 0.5).unwrap());
        assert_eq!(gbdt.current_iteration(), 1);
        assert_eq!(gbdt.models().len(), 1);
        assert_eq!(gbdt.models()[0].shrinkage(), 0.5);
        assert_relative_eq!(gbdt.training_score()[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(gbdt.training_score()[19], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_valid_set_seeded_with_existing_trees() {
        let mut gbdt = GBDT::new(config(), step_data(20)).unwrap();
        gbdt.fit_iteration(None, 0.5).unwrap();
        gbdt.fit_iteration(None, 0.5).unwrap();
        gbdt.add_valid_dataset(step_data(20)).unwrap();
        let valid = gbdt.valid_score(0).unwrap();
        for (a, b) in valid.iter().zip(gbdt.training_score()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }

        let wrong = Dataset::new(Array2::zeros((3, 2)), Array1::zeros(3), None).unwrap();
        assert!(gbdt.add_valid_dataset(wrong).is_err());
    }

    #[test]
    fn test_new_installs_logger() {
        let _gbdt = GBDT::new(config(), step_data(10)).unwrap();
        assert!(crate::core::is_logging_initialized());
    }

    #[test]
    fn test_reset_training_data_reseeds_accumulator() {
        let mut gbdt = GBDT::new(config(), step_data(20)).unwrap();
        gbdt.fit_iteration(None, 0.5).unwrap();
        gbdt.fit_iteration(None, 0.5).unwrap();

        gbdt.reset_training_data(step_data(12)).unwrap();
        assert_eq!(gbdt.training_score().len(), 12);
        let expected = gbdt.predict_raw(&step_data(12).features(), None).unwrap();
        for (i, score) in gbdt.training_score().iter().enumerate() {
            assert_relative_eq!(*score, expected[[i, 0]], epsilon = 1e-12);
        }

        // Gradient buffers follow the new size.
        assert!(!gbdt.fit_iteration(None, 0.5).unwrap());
        assert_eq!(gbdt.current_iteration(), 3);

        let wrong = Dataset::new(Array2::zeros((3, 2)), Array1::zeros(3), None).unwrap();
        assert!(matches!(
            gbdt.reset_training_data(wrong),
            Err(LightGBMError::DimensionMismatch { .. })
        ));
        assert_eq!(gbdt.training_score().len(), 12);
    }

    #[test]
    fn test_custom_gradients_length_checked() {
        let mut gbdt = GBDT::new(config(), step_data(10)).unwrap();
        let g = vec![0.0; 9];
        let h = vec![1.0; 9];
        assert!(matches!(
            gbdt.fit_iteration(Some((&g, &h)), 0.1),
            Err(LightGBMError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_custom_gradients_must_be_finite() {
        let mut gbdt = GBDT::new(config(), step_data(10)).unwrap();
        let mut g = vec![0.5; 10];
        g[3] = f64::NAN;
        let h = vec![1.0; 10];
        assert!(matches!(
            gbdt.fit_iteration(Some((&g, &h)), 0.1),
            Err(LightGBMError::Training { .. })
        ));
        assert!(gbdt.models().is_empty());
    }

    #[test]
    fn test_stops_when_no_split() {
        let mut gbdt = GBDT::new(config(), step_data(20)).unwrap();
        let g = vec![1.0; 20];
        let h = vec![1.0; 20];
        assert!(gbdt.fit_iteration(Some((&g, &h)), 0.1).unwrap());
        assert!(gbdt.models().is_empty());
        assert_eq!(gbdt.current_iteration(), 0);
    }

    #[test]
    fn test_early_stopping_records_best_iteration() {
        let config = ConfigBuilder::new()
            .boosting_type(BoostingType::GBDT)
            .num_leaves(4)
            .min_data_in_leaf(2)
            .learning_rate(0.5)
            .early_stopping_rounds(Some(1))
            .build()
            .unwrap();
        let mut gbdt = GBDT::new(config, step_data(20)).unwrap();
        // Validation labels are the mirror image, so every round makes it worse.
        let features = Array2::from_shape_fn((20, 1), |(i, _)| i as f32);
        let labels = Array1::from_shape_fn(20, |i| if i < 10 { 4.0 } else { 0.0 });
        gbdt.add_valid_dataset(Dataset::new(features, labels, None).unwrap())
            .unwrap();

        let mut stopped_at = None;
        for _ in 0..10 {
            assert!(!gbdt.fit_iteration(None, 0.5).unwrap());
            if gbdt.eval_and_check_early_stopping() {
                stopped_at = Some(gbdt.current_iteration());
                break;
            }
        }
        assert_eq!(stopped_at, Some(2));
        assert_eq!(gbdt.best_iteration(), Some(1));
        assert_eq!(gbdt.models().len(), 2);
    }

    #[test]
    fn test_predict_raw_matches_training_score() {
        let mut gbdt = GBDT::new(config(), step_data(20)).unwrap();
        for _ in 0..3 {
            gbdt.fit_iteration(None, 0.5).unwrap();
        }
        let data = step_data(20);
        let predictions = gbdt.predict_raw(&data.features(), None).unwrap();
        for i in 0..20 {
            assert_relative_eq!(predictions[[i, 0]], gbdt.training_score()[i], epsilon = 1e-9);
        }
        let model = gbdt.to_model();
        assert_eq!(model.num_iterations(), 3);
    }
}
