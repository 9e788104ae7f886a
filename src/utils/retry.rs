//! Bounded retry with exponential backoff for transient transport failures.

use std::time::Duration;
use tokio::time::sleep;

use crate::extract::ExtractError;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Initial delay between attempts
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()))
    }
}

/// Whether an error is worth retrying.
///
/// Only transport-level failures are transient; parse failures, missing
/// identifiers, and API rejections are permanent for a given request.
pub fn is_transient(error: &ExtractError) -> bool {
    matches!(error, ExtractError::Network(_))
}

/// Execute an async operation, retrying transient failures with backoff.
///
/// Permanent errors are returned immediately; transient errors are retried
/// until `max_attempts` is exhausted.
pub async fn with_retry<T, F, Fut>(config: RetryConfig, mut operation: F) -> Result<T, ExtractError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ExtractError>>,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match operation().await {
            Ok(result) => {
                if attempts > 1 {
                    tracing::info!("operation succeeded on attempt {}", attempts);
                }
                return Ok(result);
            }
            Err(error) if is_transient(&error) && attempts < config.max_attempts => {
                let delay = config.delay_for(attempts);
                tracing::debug!(
                    "transient error on attempt {}: {}, retrying in {:?}",
                    attempts,
                    error,
                    delay
                );
                sleep(delay).await;
            }
            Err(error) => {
                if attempts > 1 {
                    tracing::warn!("operation failed after {} attempts: {}", attempts, error);
                }
                return Err(error);
            }
        }
    }
}

/// Retry configuration tuned for the catalog/chapter endpoints.
pub fn transport_retry_config() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(500),
        max_delay: Duration::from_secs(10),
        backoff_multiplier: 2.0,
    }
}
