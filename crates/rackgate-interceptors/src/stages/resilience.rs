use crate::errors::InterceptError;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Bounds the business handler; elapsing maps to `HANDLER.TIMEOUT` (504).
pub async fn run_with_timeout<T, Fut>(
    operation: &str,
    limit: Duration,
    fut: Fut,
) -> Result<T, InterceptError>
where
    Fut: Future<Output = Result<T, InterceptError>>,
{
    match timeout(limit, fut).await {
        Ok(res) => res,
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "handler timed out");
            Err(InterceptError::timeout(operation, limit.as_millis() as u64))
        }
    }
}
