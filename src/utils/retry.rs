use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Exponential Backoff Retry Strategy
// ============================================================================
//
// Retries an operation while its error is transient, doubling the delay
// between attempts up to a ceiling. The wait between attempts is raced
// against the caller's cancellation token so a cancelled request stops
// retrying immediately.
//
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    fn next_delay(&self, delay: Duration) -> Duration {
        let next = Duration::from_millis(((delay.as_millis() as f64) * self.multiplier) as u64);
        next.min(self.max_delay)
    }
}

/// Result of a retry operation
#[derive(Debug)]
pub enum RetryResult<T, E> {
    /// Operation succeeded
    Success(T),
    /// Operation kept failing transiently until attempts ran out
    Failed(E),
    /// Operation failed with an error that must not be retried
    PermanentFailure(E),
    /// The cancellation token fired before the operation succeeded
    Cancelled,
}

/// Check if an error is transient (should retry) or permanent (should not retry)
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

/// Run `operation` until it succeeds, fails permanently, runs out of
/// attempts, or `cancel` fires. `operation` receives the 1-based attempt number.
pub async fn retry_on_transient<F, Fut, T, E>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsTransient,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return RetryResult::Cancelled,
            outcome = operation(attempt) => outcome,
        };

        match outcome {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempt = attempt, "Operation succeeded after retry");
                }
                return RetryResult::Success(result);
            }
            Err(error) => {
                if !error.is_transient() {
                    tracing::error!(error = %error, "Permanent failure detected, not retrying");
                    return RetryResult::PermanentFailure(error);
                }

                if attempt >= max_attempts {
                    tracing::error!(
                        attempt = attempt,
                        error = %error,
                        "Operation failed after all retries"
                    );
                    return RetryResult::Failed(error);
                }

                tracing::warn!(
                    attempt = attempt,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying after delay"
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return RetryResult::Cancelled,
                    _ = tokio::time::sleep(delay) => {}
                }

                delay = config.next_delay(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    enum TestError {
        Flaky,
        Fatal,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl IsTransient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, TestError::Flaky)
        }
    }

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_eventually() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_on_transient(&fast_config(3), &CancellationToken::new(), |_attempt| {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(TestError::Flaky)
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert!(matches!(result, RetryResult::Success("success")));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_fails_after_max_attempts() {
        let result = retry_on_transient(&fast_config(2), &CancellationToken::new(), |_attempt| async {
            Err::<(), _>(TestError::Flaky)
        })
        .await;

        assert!(matches!(result, RetryResult::Failed(TestError::Flaky)));
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_on_transient(&fast_config(5), &CancellationToken::new(), |_attempt| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(TestError::Fatal) }
        })
        .await;

        assert!(matches!(result, RetryResult::PermanentFailure(TestError::Fatal)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_retrying() {
        let cancel = CancellationToken::new();
        let config = RetryConfig {
            max_attempts: 10,
            initial_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(30),
            multiplier: 1.0,
        };

        let trigger = cancel.clone();
        let result = retry_on_transient(&config, &cancel, |attempt| {
            if attempt == 1 {
                trigger.cancel();
            }
            async { Err::<(), _>(TestError::Flaky) }
        })
        .await;

        assert!(matches!(result, RetryResult::Cancelled));
    }

    #[test]
    fn test_delay_is_capped() {
        let config = fast_config(3);
        assert_eq!(config.next_delay(Duration::from_millis(5)), Duration::from_millis(10));
        assert_eq!(config.next_delay(Duration::from_millis(15)), Duration::from_millis(20));
    }
}
