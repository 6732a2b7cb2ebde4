//! Bounded waits on external calls.

use liftrag_core::{AppError, AppResult};
use std::future::Future;
use std::time::Duration;

/// Await `call`, failing with `AppError::Timeout` once `limit` elapses.
pub(crate) async fn with_deadline<T, F>(limit: Duration, what: &str, call: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{} did not finish within {:?}",
            what, limit
        ))),
    }
}
