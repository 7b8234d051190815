use crate::errors::{Result, StoreUnavailable};
use std::future::Future;
use std::time::Duration;

/// Runs one external call under `limit`. An expired deadline is reported the same way
/// as any other store failure, naming `operation`.
pub async fn with_deadline<T, F>(operation: &str, limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreUnavailable(format!(
            "{operation} timed out after {}s",
            limit.as_secs_f64()
        ))),
    }
}
