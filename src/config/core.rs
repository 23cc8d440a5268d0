//! Core configuration structure and builder.
//!
//! This module provides the main configuration structure and builder pattern
//! for setting up boosting parameters, the dropout parameters used by DART,
//! and the evaluation/early-stopping surface of the base trainer.

use crate::boosting::dart::{DartParams, NormalizationMode};
use crate::core::constants::*;
use crate::core::error::{LightGBMError, Result};
use crate::core::types::*;
use crate::{config_error, ensure};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for training.
///
/// Unknown fields are rejected when loading from a file, missing fields take
/// their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    // Core training parameters
    /// Objective function type
    pub objective: ObjectiveType,
    /// Boosting algorithm type
    pub boosting_type: BoostingType,
    /// Number of boosting iterations
    pub num_iterations: usize,
    /// Base learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum number of leaves in one tree
    pub num_leaves: usize,
    /// Maximum depth of tree (-1 for unlimited)
    pub max_depth: i32,

    // Regularization parameters
    /// L2 regularization term on leaf values
    pub lambda_l2: f64,
    /// Minimum number of data points in a leaf
    pub min_data_in_leaf: DataSize,
    /// Minimum sum of hessian values in a leaf
    pub min_sum_hessian_in_leaf: f64,
    /// Minimum gain required to make a split
    pub min_gain_to_split: f64,

    // Multiclass parameters
    /// Number of classes for multiclass classification
    pub num_class: usize,

    // Early stopping
    /// Early stopping rounds (None = disabled)
    pub early_stopping_rounds: Option<usize>,
    /// Minimum improvement that resets the early stopping counter
    pub early_stopping_tolerance: f64,

    // Validation and metrics
    /// Metrics to evaluate during training (empty = objective default)
    pub metric: Vec<MetricType>,
    /// Frequency of metric evaluation and output
    pub metric_freq: usize,
    /// Whether to compute training metrics
    pub is_training_metric: bool,

    // Output control
    /// Default log filter, installed by the first booster constructed
    pub verbosity: VerbosityLevel,
    /// Number of threads for score updates (0 = global rayon pool)
    pub num_threads: usize,

    // DART parameters
    /// Probability of skipping the dropout step in a round
    pub skip_drop: f64,
    /// Per-round dropout probability of each previous round
    pub drop_rate: f64,
    /// Random seed for dropout
    pub drop_seed: u64,
    /// Use XGBoost-style DART normalization
    pub xgboost_dart_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            objective: ObjectiveType::Regression,
            boosting_type: BoostingType::DART,
            num_iterations: DEFAULT_NUM_ITERATIONS,
            learning_rate: DEFAULT_LEARNING_RATE,
            num_leaves: DEFAULT_NUM_LEAVES,
            max_depth: DEFAULT_MAX_DEPTH,

            lambda_l2: DEFAULT_LAMBDA_L2,
            min_data_in_leaf: DEFAULT_MIN_DATA_IN_LEAF,
            min_sum_hessian_in_leaf: DEFAULT_MIN_SUM_HESSIAN_IN_LEAF,
            min_gain_to_split: 0.0,

            num_class: DEFAULT_NUM_CLASS,

            early_stopping_rounds: None,
            early_stopping_tolerance: DEFAULT_EARLY_STOPPING_TOLERANCE,

            metric: Vec::new(),
            metric_freq: DEFAULT_METRIC_FREQ,
            is_training_metric: false,

            verbosity: DEFAULT_VERBOSITY,
            num_threads: DEFAULT_NUM_THREADS,

            skip_drop: DEFAULT_SKIP_DROP,
            drop_rate: DEFAULT_DROP_RATE,
            drop_seed: DEFAULT_DROP_SEED,
            xgboost_dart_mode: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters.
    ///
    /// Probabilities are rejected when out of range, never clamped.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.learning_rate > 0.0 && self.learning_rate <= 1.0,
            invalid("learning_rate", self.learning_rate, "must be in range (0.0, 1.0]")
        );
        ensure!(
            self.num_leaves >= 2,
            invalid("num_leaves", self.num_leaves, "must be at least 2")
        );
        ensure!(
            self.lambda_l2 >= 0.0,
            invalid("lambda_l2", self.lambda_l2, "must be non-negative")
        );
        ensure!(
            self.min_data_in_leaf >= 1,
            invalid("min_data_in_leaf", self.min_data_in_leaf, "must be at least 1")
        );
        ensure!(
            self.min_sum_hessian_in_leaf >= 0.0,
            invalid("min_sum_hessian_in_leaf", self.min_sum_hessian_in_leaf, "must be non-negative")
        );

        match self.objective {
            ObjectiveType::Multiclass => ensure!(
                self.num_class >= 2,
                invalid("num_class", self.num_class, "must be at least 2 for multiclass objective")
            ),
            _ => ensure!(
                self.num_class == 1,
                invalid("num_class", self.num_class, "must be 1 for non-multiclass objectives")
            ),
        }

        ensure!(
            self.early_stopping_rounds != Some(0),
            invalid("early_stopping_rounds", 0, "must be positive when specified")
        );

        for (name, value) in [("drop_rate", self.drop_rate), ("skip_drop", self.skip_drop)] {
            ensure!(
                (0.0..=1.0).contains(&value),
                invalid(name, value, "must be in range [0.0, 1.0]")
            );
        }

        let cores = num_cpus::get();
        if self.num_threads > cores * 2 {
            log::warn!(
                "num_threads ({}) is much larger than available cores ({})",
                self.num_threads,
                cores
            );
        }

        Ok(())
    }

    /// Load configuration from a `.json` or `.toml` file and validate it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| config_error!("Failed to read config file: {}", e))?;

        let config: Config = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| LightGBMError::config(format!("Failed to parse JSON config: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| LightGBMError::config(format!("Failed to parse TOML config: {}", e)))?,
            _ => {
                return Err(config_error!(
                    "Unsupported config file format. Use .json or .toml"
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| LightGBMError::config(format!("Failed to serialize to JSON: {}", e)))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| LightGBMError::config(format!("Failed to serialize to TOML: {}", e)))?,
            _ => {
                return Err(config_error!(
                    "Unsupported config file format. Use .json or .toml"
                ))
            }
        };

        std::fs::write(path, content)
            .map_err(|e| LightGBMError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get the number of trees per iteration (depends on objective)
    pub fn num_trees_per_iteration(&self) -> usize {
        match self.objective {
            ObjectiveType::Regression | ObjectiveType::Binary => 1,
            ObjectiveType::Multiclass => self.num_class,
        }
    }

    /// Check if early stopping is enabled
    pub fn is_early_stopping_enabled(&self) -> bool {
        self.early_stopping_rounds.is_some()
    }

    /// Metrics to evaluate, falling back to the objective's default metric.
    pub fn effective_metrics(&self) -> Vec<MetricType> {
        if !self.metric.is_empty() {
            return self.metric.clone();
        }
        match self.objective {
            ObjectiveType::Regression => vec![MetricType::L2],
            ObjectiveType::Binary => vec![MetricType::BinaryLogloss],
            ObjectiveType::Multiclass => vec![MetricType::MultiLogloss],
        }
    }

    /// The parameters consumed by the DART dropout mechanism.
    pub fn dart_params(&self) -> DartParams {
        DartParams {
            skip_drop: self.skip_drop,
            drop_rate: self.drop_rate,
            drop_seed: self.drop_seed,
            learning_rate: self.learning_rate,
            mode: if self.xgboost_dart_mode {
                NormalizationMode::Xgboost
            } else {
                NormalizationMode::Standard
            },
        }
    }
}

fn invalid<V: ToString>(parameter: &str, value: V, reason: &str) -> LightGBMError {
    LightGBMError::invalid_parameter(parameter, value.to_string(), reason)
}

/// Builder for creating configurations with a fluent interface.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new configuration builder with default values
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Set the objective function
    pub fn objective(mut self, objective: ObjectiveType) -> Self {
        self.config.objective = objective;
        self
    }

    /// Set the boosting algorithm
    pub fn boosting_type(mut self, boosting_type: BoostingType) -> Self {
        self.config.boosting_type = boosting_type;
        self
    }

    /// Set the number of iterations
    pub fn num_iterations(mut self, iterations: usize) -> Self {
        self.config.num_iterations = iterations;
        self
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.config.learning_rate = rate;
        self
    }

    /// Set the number of leaves
    pub fn num_leaves(mut self, leaves: usize) -> Self {
        self.config.num_leaves = leaves;
        self
    }

    /// Set the maximum depth
    pub fn max_depth(mut self, depth: i32) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Set L2 regularization
    pub fn lambda_l2(mut self, lambda: f64) -> Self {
        self.config.lambda_l2 = lambda;
        self
    }

    /// Set minimum data in leaf
    pub fn min_data_in_leaf(mut self, min_data: DataSize) -> Self {
        self.config.min_data_in_leaf = min_data;
        self
    }

    /// Set minimum sum of hessians in leaf
    pub fn min_sum_hessian_in_leaf(mut self, min_hessian: f64) -> Self {
        self.config.min_sum_hessian_in_leaf = min_hessian;
        self
    }

    /// Set minimum gain to split
    pub fn min_gain_to_split(mut self, gain: f64) -> Self {
        self.config.min_gain_to_split = gain;
        self
    }

    /// Set number of classes
    pub fn num_class(mut self, num_class: usize) -> Self {
        self.config.num_class = num_class;
        self
    }

    /// Set early stopping rounds
    pub fn early_stopping_rounds(mut self, rounds: Option<usize>) -> Self {
        self.config.early_stopping_rounds = rounds;
        self
    }

    /// Set early stopping tolerance
    pub fn early_stopping_tolerance(mut self, tolerance: f64) -> Self {
        self.config.early_stopping_tolerance = tolerance;
        self
    }

    /// Set evaluation metrics
    pub fn metric(mut self, metric: Vec<MetricType>) -> Self {
        self.config.metric = metric;
        self
    }

    /// Set metric output frequency
    pub fn metric_freq(mut self, freq: usize) -> Self {
        self.config.metric_freq = freq;
        self
    }

    /// Evaluate metrics on the training data too
    pub fn is_training_metric(mut self, enabled: bool) -> Self {
        self.config.is_training_metric = enabled;
        self
    }

    /// Set verbosity
    pub fn verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    /// Set number of threads
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Set the probability of skipping dropout in a round
    pub fn skip_drop(mut self, probability: f64) -> Self {
        self.config.skip_drop = probability;
        self
    }

    /// Set the dropout rate
    pub fn drop_rate(mut self, rate: f64) -> Self {
        self.config.drop_rate = rate;
        self
    }

    /// Set the dropout seed
    pub fn drop_seed(mut self, seed: u64) -> Self {
        self.config.drop_seed = seed;
        self
    }

    /// Enable XGBoost-style normalization
    pub fn xgboost_dart_mode(mut self, enabled: bool) -> Self {
        self.config.xgboost_dart_mode = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
