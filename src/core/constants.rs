//! Default configuration values and numerical constants.

use crate::core::types::*;

/// Default minimum number of data points required in a leaf.
pub const DEFAULT_MIN_DATA_IN_LEAF: DataSize = 20;

/// Default minimum sum of hessian values required in a leaf.
/// Provides numerical stability for leaf value calculation.
pub const DEFAULT_MIN_SUM_HESSIAN_IN_LEAF: f64 = 1e-3;

/// Default maximum tree depth. Negative value means no limit.
pub const DEFAULT_MAX_DEPTH: i32 = -1;

/// Default number of leaves for each tree.
pub const DEFAULT_NUM_LEAVES: usize = 31;

/// Default learning rate (shrinkage) for gradient boosting.
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Default L2 regularization parameter.
pub const DEFAULT_LAMBDA_L2: f64 = 0.0;

/// Default number of boosting iterations.
pub const DEFAULT_NUM_ITERATIONS: usize = 100;

/// Default number of classes.
pub const DEFAULT_NUM_CLASS: usize = 1;

/// Default early stopping tolerance.
pub const DEFAULT_EARLY_STOPPING_TOLERANCE: f64 = 0.0;

/// Default number of threads for parallel processing.
/// 0 means use the global rayon pool.
pub const DEFAULT_NUM_THREADS: usize = 0;

/// Default metric output frequency in iterations.
pub const DEFAULT_METRIC_FREQ: usize = 1;

/// Default verbosity level for logging.
pub const DEFAULT_VERBOSITY: VerbosityLevel = VerbosityLevel::Info;

/// Default probability of skipping the dropout step for a whole round.
pub const DEFAULT_SKIP_DROP: f64 = 0.5;

/// Default per-round dropout probability.
pub const DEFAULT_DROP_RATE: f64 = 0.1;

/// Default seed of the dropout random stream.
pub const DEFAULT_DROP_SEED: u64 = 4;

/// Small epsilon used to keep denominators away from zero.
pub const K_EPSILON: f64 = 1e-15;

/// Probabilities are clipped to `[K_MIN_PROB, 1 - K_MIN_PROB]` in log losses.
pub const K_MIN_PROB: f64 = 1e-15;

/// Library version string.
pub const LIGHTGBM_DART_VERSION: &str = env!("CARGO_PKG_VERSION");
