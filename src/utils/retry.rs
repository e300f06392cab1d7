// Retry with exponential backoff

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::sleep;
use tracing::warn;

use crate::types::AppResult;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling each time
    /// and capped at 32x the base delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt.saturating_sub(1).min(5))
    }
}

/// Run `operation` until it succeeds, fails with a non-transient error,
/// or the retry budget is spent.
pub async fn with_retry<'a, F, T>(policy: RetryPolicy, mut operation: F) -> AppResult<T>
where
    F: FnMut() -> BoxFuture<'a, AppResult<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(error) if error.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                warn!(attempt, ?delay, error = %error, "Retrying after transient failure");
                sleep(delay).await;
            }
            Err(error) => return Err(error),
        }
    }
}
