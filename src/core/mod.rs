//! Core infrastructure module.
//!
//! This module provides the foundational pieces shared by the rest of the
//! crate:
//!
//! - [`types`]: Fundamental data types and enumerations
//! - [`constants`]: Configuration defaults and numerical constants
//! - [`error`]: Error type and result alias
//! - [`utils`]: The seeded random stream and thread pool helpers
//!
//! ```rust
//! use lightgbm_dart::core::{
//!     types::{Score, ObjectiveType},
//!     constants::DEFAULT_LEARNING_RATE,
//!     error::{Result, LightGBMError},
//! };
//!
//! let learning_rate = DEFAULT_LEARNING_RATE;
//! let objective = ObjectiveType::Regression;
//! # let _ = (learning_rate, objective);
//! ```

pub mod constants;
pub mod error;
pub mod types;
pub mod utils;

pub use constants::*;
pub use error::{LightGBMError, Result};
pub use types::*;

use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Install `env_logger` with a default filter derived from `verbosity`.
///
/// `RUST_LOG` still takes precedence. Calling this more than once, or after
/// another logger has been installed, is harmless.
pub fn initialize_logging(verbosity: VerbosityLevel) {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    let env = env_logger::Env::default().default_filter_or(verbosity.as_filter());
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already installed, keeping existing one");
    }
}

/// Check whether [`initialize_logging`] has run.
pub fn is_logging_initialized() -> bool {
    LOGGING_INITIALIZED.load(Ordering::SeqCst)
}
