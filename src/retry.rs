use crate::{PlaylistError, Result};
use std::future::Future;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay for exponential backoff (in seconds)
    pub base_delay: u64,
    /// Maximum delay cap (in seconds)
    pub max_delay: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: 1,
            max_delay: 60,
        }
    }
}

/// Result of a retry operation with context
#[derive(Debug)]
pub struct RetryResult<T> {
    /// The successful result
    pub result: T,
    /// Number of retry attempts made
    pub attempts_made: u32,
    /// Total time spent waiting (in seconds)
    pub total_retry_time: u64,
}

/// Delay before retry number `retries` (0-based) after the server asked for `retry_after`.
///
/// The server's own hint is always honoured; backoff is added on top and the
/// sum is capped at `max_delay` unless the hint alone is longer.
pub fn backoff_delay(config: &RetryConfig, retry_after: u64, retries: u32) -> u64 {
    let backoff = config.base_delay.saturating_mul(2_u64.saturating_pow(retries));
    let delay = retry_after.saturating_add(backoff).min(config.max_delay);
    delay.max(retry_after)
}

/// Execute an async operation, retrying when the platform rate limits it.
///
/// Only [`PlaylistError::RateLimit`] is retried; every other error is
/// returned at once.
///
/// # Arguments
/// * `config` - Retry configuration
/// * `operation_name` - Name of the operation for logging
/// * `operation` - Async function that returns a Result
/// * `on_rate_limit` - Callback for rate limit events (delay in seconds)
pub async fn retry_with_backoff<T, F, Fut, OnRateLimit>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    mut on_rate_limit: OnRateLimit,
) -> Result<RetryResult<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    OnRateLimit: FnMut(u64, &str),
{
    let mut retries = 0;
    let mut total_retry_time = 0;

    loop {
        match operation().await {
            Ok(result) => {
                return Ok(RetryResult {
                    result,
                    attempts_made: retries,
                    total_retry_time,
                });
            }
            Err(PlaylistError::RateLimit { retry_after }) => {
                if retries >= config.max_retries {
                    log::warn!(
                        "Max retries ({}) exceeded for {} operation",
                        config.max_retries,
                        operation_name
                    );
                    return Err(PlaylistError::RateLimit { retry_after });
                }

                let delay = backoff_delay(config, retry_after, retries);
                log::info!(
                    "{} rate limited. Waiting {} seconds before retry {} of {}",
                    operation_name,
                    delay,
                    retries + 1,
                    config.max_retries
                );
                on_rate_limit(delay, operation_name);

                tokio::time::sleep(std::time::Duration::from_secs(delay)).await;
                retries += 1;
                total_retry_time += delay;
            }
            Err(other_error) => return Err(other_error),
        }
    }
}

/// Retry with default rate limit logging.
pub async fn retry_operation<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_backoff(config, operation_name, operation, |delay, op_name| {
        log::debug!("Rate limited during {op_name}: waiting {delay} seconds");
    })
    .await
    .map(|retry| retry.result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay: 1,
            max_delay: 60,
        }
    }

    #[test]
    fn test_backoff_delay() {
        let config = config(3);
        assert_eq!(backoff_delay(&config, 2, 0), 3);
        assert_eq!(backoff_delay(&config, 2, 1), 4);
        assert_eq!(backoff_delay(&config, 2, 3), 10);
        // capped, but never below what the server asked for
        assert_eq!(backoff_delay(&config, 50, 4), 60);
        assert_eq!(backoff_delay(&config, 120, 0), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_operation() {
        let result = retry_with_backoff(
            &config(3),
            "test",
            || async { Ok::<i32, PlaylistError>(42) },
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(result.result, 42);
        assert_eq!(result.attempts_made, 0);
        assert_eq!(result.total_retry_time, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_on_rate_limit() {
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();
        let mut notified = Vec::new();

        let result = retry_with_backoff(
            &config(2),
            "search",
            move || {
                let count = call_count_clone.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count < 2 {
                        Err(PlaylistError::RateLimit { retry_after: 1 })
                    } else {
                        Ok::<i32, PlaylistError>(42)
                    }
                }
            },
            |delay, name| notified.push((delay, name.to_string())),
        )
        .await
        .unwrap();

        assert_eq!(result.result, 42);
        assert_eq!(result.attempts_made, 2);
        assert_eq!(result.total_retry_time, 2 + 3);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
        assert_eq!(
            notified,
            vec![(2, "search".to_string()), (3, "search".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_retries_exceeded() {
        let result = retry_operation(&config(1), "test", || async {
            Err::<i32, PlaylistError>(PlaylistError::RateLimit { retry_after: 1 })
        })
        .await;

        match result {
            Err(PlaylistError::RateLimit { .. }) => {}
            other => panic!("Expected rate limit error, got: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_not_retried() {
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = retry_operation(&config(3), "test", move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<i32, PlaylistError>(PlaylistError::Http("reset".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(PlaylistError::Http(_))));
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }
}
