//! Dataset management.
//!
//! Training and validation data are held as dense `ndarray` matrices of raw
//! feature values. Each score accumulator owns the dataset it scores.

pub mod dataset;

pub use dataset::Dataset;
