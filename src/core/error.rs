//! Error type shared by every layer of the booster.
//!
//! Configuration and data problems are detected up front and are not
//! recoverable. Round protocol misuse and training failures leave the booster
//! at a round boundary, so the caller may retry or continue.

use std::fmt::Debug;
use std::io;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum LightGBMError {
    /// Invalid or inconsistent configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// Malformed training or validation data
    #[error("Dataset error: {message}")]
    Dataset {
        /// What was wrong
        message: String,
    },

    /// Failure while fitting a round
    #[error("Training error: {message}")]
    Training {
        /// What went wrong
        message: String,
    },

    /// A DART round step was called out of order
    #[error("Cannot {operation} while the round is {phase}")]
    RoundProtocol {
        /// Step that was attempted
        operation: &'static str,
        /// Phase the round was in
        phase: String,
    },

    /// The tree learner rejected its input
    #[error("Tree construction error: {message}")]
    TreeConstruction {
        /// Learner message
        message: String,
    },

    /// A saved model does not describe a valid ensemble
    #[error("Serialization error: {message}")]
    Serialization {
        /// What was wrong
        message: String,
    },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        /// Underlying error
        #[from]
        source: io::Error,
    },

    /// JSON encoding or decoding errors
    #[error("JSON error: {source}")]
    Json {
        /// Underlying error
        #[from]
        source: serde_json::Error,
    },

    /// A parameter value outside its allowed range
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Offending value
        value: String,
        /// Allowed range or rule
        reason: String,
    },

    /// Buffer or matrix shapes disagree
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected shape
        expected: String,
        /// Actual shape
        actual: String,
    },

    /// An index points past the end of a collection
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds {
        /// Offending index
        index: usize,
        /// Collection length
        length: usize,
    },
}

/// Type alias for Results using LightGBMError
pub type Result<T> = std::result::Result<T, LightGBMError>;

impl LightGBMError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        LightGBMError::Config {
            message: message.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        LightGBMError::Dataset {
            message: message.into(),
        }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        LightGBMError::Training {
            message: message.into(),
        }
    }

    /// Report `operation` attempted while the round is in `phase`.
    pub fn round_protocol<P: Debug>(operation: &'static str, phase: P) -> Self {
        LightGBMError::RoundProtocol {
            operation,
            phase: format!("{:?}", phase),
        }
    }

    /// Create a tree construction error
    pub fn tree_construction<S: Into<String>>(message: S) -> Self {
        LightGBMError::TreeConstruction {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        LightGBMError::Serialization {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        LightGBMError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        LightGBMError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        LightGBMError::IndexOutOfBounds { index, length }
    }

    /// Whether the booster is still usable after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LightGBMError::Training { .. }
                | LightGBMError::RoundProtocol { .. }
                | LightGBMError::TreeConstruction { .. }
        )
    }

    /// Short category name for log lines.
    pub fn category(&self) -> &'static str {
        match self {
            LightGBMError::Config { .. } | LightGBMError::InvalidParameter { .. } => "config",
            LightGBMError::Dataset { .. }
            | LightGBMError::DimensionMismatch { .. }
            | LightGBMError::IndexOutOfBounds { .. } => "data",
            LightGBMError::Training { .. } | LightGBMError::TreeConstruction { .. } => "training",
            LightGBMError::RoundProtocol { .. } => "round_protocol",
            LightGBMError::Serialization { .. } | LightGBMError::Json { .. } => "serialization",
            LightGBMError::IO { .. } => "io",
        }
    }
}

/// Build a [`LightGBMError::Config`] from a message or format string.
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::LightGBMError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::LightGBMError::config(format!($fmt, $($arg)*))
    };
}

/// Build a [`LightGBMError::Training`] from a message or format string.
#[macro_export]
macro_rules! training_error {
    ($msg:expr) => {
        $crate::core::error::LightGBMError::training($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::LightGBMError::training(format!($fmt, $($arg)*))
    };
}

/// Return early with the given error when the condition does not hold.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum Phase {
        Fitted,
    }

    #[test]
    fn test_categories_and_recoverability() {
        let err = LightGBMError::invalid_parameter("drop_rate", "1.5", "must be in range [0.0, 1.0]");
        assert_eq!(err.category(), "config");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("drop_rate = 1.5"));

        let err = LightGBMError::dimension_mismatch("10 gradients", "9 gradients");
        assert_eq!(err.category(), "data");

        let err = LightGBMError::tree_construction("bad split");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_round_protocol_message() {
        let err = LightGBMError::round_protocol("begin a round", Phase::Fitted);
        assert_eq!(err.to_string(), "Cannot begin a round while the round is Fitted");
        assert_eq!(err.category(), "round_protocol");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_macros() {
        let err = config_error!("test error");
        assert!(matches!(err, LightGBMError::Config { .. }));

        let err = training_error!("gradient {} is not finite", 3);
        assert!(matches!(err, LightGBMError::Training { .. }));
        assert!(err.to_string().contains("gradient 3"));
    }

    #[test]
    fn test_ensure_macro() {
        fn check(value: f64) -> Result<()> {
            ensure!(value >= 0.0, LightGBMError::invalid_parameter("x", value.to_string(), "negative"));
            Ok(())
        }
        assert!(check(1.0).is_ok());
        assert!(matches!(check(-1.0), Err(LightGBMError::InvalidParameter { .. })));
    }

    #[test]
    fn test_source_conversions() {
        let err: LightGBMError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.category(), "io");

        let err: LightGBMError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert_eq!(err.category(), "serialization");
    }
}
