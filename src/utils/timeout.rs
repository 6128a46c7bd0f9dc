//! Timeout utilities for user code run by the engine
//!
//! Factories and hooks are awaited without a limit unless the engine
//! configuration sets one (see `TimeoutConfig`).

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Await a future, bounded by `limit` when one is given
///
/// Returns the elapsed limit as the error on timeout.
pub async fn with_optional_timeout<F>(
    future: F,
    limit: Option<Duration>,
) -> Result<F::Output, Duration>
where
    F: Future,
{
    match limit {
        Some(limit) => timeout(limit, future).await.map_err(|_| limit),
        None => Ok(future.await),
    }
}
