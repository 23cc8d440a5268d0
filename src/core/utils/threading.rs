//! Thread pool construction for the data-parallel parts of training.
//!
//! Per-example score accumulation runs on rayon. When a fixed thread count is
//! configured a dedicated pool is built; otherwise the global pool is used.

use crate::core::error::{LightGBMError, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Build a dedicated pool for `num_threads > 0`, or `None` to use the global pool.
pub fn build_thread_pool(num_threads: usize) -> Result<Option<ThreadPool>> {
    if num_threads == 0 {
        return Ok(None);
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("lightgbm-dart-{}", i))
        .build()
        .map_err(|e| LightGBMError::config(format!("Failed to build thread pool: {}", e)))?;
    log::debug!("Using dedicated thread pool with {} threads", num_threads);
    Ok(Some(pool))
}

/// Run `op` inside `pool` when one is present, otherwise on the caller's pool.
pub fn run_in_pool<R, F>(pool: Option<&ThreadPool>, op: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}
