//! Utilities shared by the boosting layers.

/// Seeded pseudo-random stream
pub mod random;
/// Rayon thread pool helpers
pub mod threading;
