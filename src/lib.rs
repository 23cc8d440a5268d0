//! # LightGBM DART
//!
//! DART boosting ("dropouts meet multiple additive regression trees") in pure
//! Rust. Every round a random subset of earlier rounds is removed from the
//! training score before the new trees are fit; afterwards the dropped trees
//! are rescaled so that the training and validation scores are again exact
//! sums of every tree's current weighted output.
//!
//! ## Features
//!
//! - **Two normalization regimes**: the standard `k / (k + 1)` rule and the
//!   XGBoost-style `k / (lr + k)` rule, selected by `xgboost_dart_mode`.
//! - **Reproducible dropout**: a seeded LightGBM-compatible random stream with a
//!   fixed draw order.
//! - **Explicit round protocol**: `begin_round`, `ensure_dropped`,
//!   `fit_and_renormalize` and `end_round`, with misuse reported as errors.
//! - **Base trainer included**: leaf-wise regression trees, L2, binary and
//!   multiclass objectives, metrics and early stopping.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lightgbm_dart::{create_boosting, ConfigBuilder, Dataset};
//! use ndarray::{Array1, Array2};
//!
//! # fn main() -> lightgbm_dart::Result<()> {
//! lightgbm_dart::init();
//!
//! let features = Array2::from_shape_fn((100, 2), |(i, j)| (i * (j + 1)) as f32);
//! let labels = Array1::from_shape_fn(100, |i| (i % 7) as f32);
//! let train = Dataset::new(features.clone(), labels, None)?;
//!
//! let config = ConfigBuilder::new()
//!     .num_iterations(50)
//!     .learning_rate(0.1)
//!     .drop_rate(0.1)
//!     .skip_drop(0.5)
//!     .build()?;
//!
//! let mut booster = create_boosting(config, train)?;
//! booster.train()?;
//! let predictions = booster.predict_raw(&features.view(), None)?;
//! println!("{:?}", predictions.row(0));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Dataset management module
pub mod dataset;

// Trees and tree learners
pub mod tree;

// Boosting module
pub mod boosting;

// Re-export core functionality for convenience
pub use self::core::{
    constants::*,
    error::{LightGBMError, Result},
    types::*,
};

// Re-export configuration functionality
pub use config::{Config, ConfigBuilder};

// Re-export dataset functionality
pub use dataset::Dataset;

// Re-export tree functionality
pub use tree::{SerialTreeLearner, Tree, TreeLearner};

// Re-export boosting functionality
pub use boosting::{
    create_boosting, Boosting, DartParams, DropSelector, Model, NormalizationMode, RoundPhase,
    RoundSummary, ScoreAccumulator, ScoreUpdater, DART, GBDT,
};

// Version information
pub use self::core::constants::LIGHTGBM_DART_VERSION as VERSION;

/// Install the logger at the default verbosity.
///
/// `RUST_LOG` overrides the default filter. Repeated calls are harmless.
///
/// ```rust
/// lightgbm_dart::init();
/// assert!(lightgbm_dart::is_initialized());
/// ```
pub fn init() {
    core::initialize_logging(DEFAULT_VERBOSITY);
}

/// Install the logger with a default filter for `verbosity`.
pub fn init_with_verbosity(verbosity: VerbosityLevel) {
    core::initialize_logging(verbosity);
}

/// Check whether the logger has been installed through this crate.
pub fn is_initialized() -> bool {
    core::is_logging_initialized()
}
