//! Bounded exponential backoff for rate-limited upstreams.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{QuoteError, Result};

/// Default number of attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default growth factor between retries.
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Default upper bound for a single delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);

/// Retry policy applied to a provider's whole `resolve` call.
///
/// The delay before retry `n` (1-based) is `base_delay * multiplier^(n-1)`,
/// capped at `max_delay`. Delays are awaited in-line, so the caller is held
/// across the whole sequence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth factor applied per retry. Values below 1.0 are treated as 1.0.
    pub multiplier: f64,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_ATTEMPTS,
            DEFAULT_BASE_DELAY,
            DEFAULT_MULTIPLIER,
            DEFAULT_MAX_DELAY,
        )
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    #[must_use]
    pub const fn new(
        max_attempts: u32,
        base_delay: Duration,
        multiplier: f64,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier,
            max_delay,
        }
    }

    /// A policy that makes exactly one attempt.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, 1.0, Duration::ZERO)
    }

    /// Returns the delay awaited before retry number `retry` (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let factor = self.multiplier.max(1.0).powi(exponent);
        let secs = self.base_delay.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is spent.
    ///
    /// The last error is returned once attempts are exhausted.
    pub async fn run<T, F, Fut, P>(
        &self,
        provider: &str,
        mut operation: F,
        retryable: P,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&QuoteError) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && retryable(&e) => {
                    let delay = self.delay_for(attempt);
                    debug!(
                        provider,
                        attempt,
                        delay_ms = saturating_millis(delay),
                        error = %e,
                        "Retrying after backoff"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if retryable(&e) {
                        warn!(provider, attempts, error = %e, "Retry attempts exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(1),
            2.0,
            Duration::from_millis(4),
        )
    }

    fn rate_limited() -> QuoteError {
        QuoteError::RateLimited {
            provider: "test".to_string(),
            retry_after: None,
        }
    }

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(8));
        assert_eq!(policy.delay_for(5), Duration::from_secs(10));
        assert_eq!(policy.delay_for(60), Duration::from_secs(10));
    }

    #[test]
    fn test_sub_unit_multiplier_does_not_shrink() {
        let policy = RetryPolicy::new(
            3,
            Duration::from_millis(100),
            0.5,
            Duration::from_secs(1),
        );
        assert_eq!(policy.delay_for(3), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = &AtomicU32::new(0);
        let result = fast_policy(5)
            .run(
                "test",
                move || async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 { Err(rate_limited()) } else { Ok(n) }
                },
                QuoteError::is_rate_limited,
            )
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_on_non_retryable_error() {
        let calls = &AtomicU32::new(0);
        let result: Result<()> = fast_policy(5)
            .run(
                "test",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(QuoteError::Network("reset".to_string()))
                },
                QuoteError::is_rate_limited,
            )
            .await;

        assert!(matches!(result, Err(QuoteError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let calls = &AtomicU32::new(0);
        let result: Result<()> = fast_policy(3)
            .run(
                "test",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(rate_limited())
                },
                QuoteError::is_rate_limited,
            )
            .await;

        assert!(matches!(result, Err(QuoteError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_policy_makes_single_attempt() {
        let calls = &AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::no_retry()
            .run(
                "test",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(rate_limited())
                },
                QuoteError::is_rate_limited,
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_saturating_millis() {
        assert_eq!(saturating_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(saturating_millis(Duration::from_micros(999)), 0);
        assert_eq!(saturating_millis(Duration::MAX), u64::MAX);
    }
}
