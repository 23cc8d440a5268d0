//! Configuration management.
//!
//! [`Config`] carries the boosting, tree-learning, evaluation and dropout
//! parameters. It is validated when built through [`ConfigBuilder`] and when
//! loaded from a JSON or TOML file, so out-of-range probabilities are reported
//! before any training starts.

pub mod core;

pub use self::core::{Config, ConfigBuilder};
