//! Deadline-wrapped operations and retry with backoff + jitter.
//!
//! Grounded on the same "wrap a future with a policy" shape the correlation
//! manager uses for its cleanup loop, generalized to arbitrary async
//! operations. Jitter uses `rand`, the one dependency this crate carries
//! that the teacher never needed — it has no retry layer of its own.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

/// Backoff shape between retry attempts. `Custom` takes the attempt number
/// (1-indexed) and returns a delay, so callers can plug in policies this
/// type can't otherwise express, at the cost of not being serializable.
#[derive(Clone)]
pub enum Backoff {
    /// Every attempt waits the same `base_delay`.
    Constant,
    /// Attempt `n` waits `base_delay * n`.
    Linear,
    /// Attempt `n` waits `base_delay * 2^(n-1)`.
    Exponential,
    /// Caller-supplied delay function of the attempt number.
    Custom(fn(u32) -> Duration),
}

impl std::fmt::Debug for Backoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backoff::Constant => write!(f, "Backoff::Constant"),
            Backoff::Linear => write!(f, "Backoff::Linear"),
            Backoff::Exponential => write!(f, "Backoff::Exponential"),
            Backoff::Custom(_) => write!(f, "Backoff::Custom(..)"),
        }
    }
}

impl Backoff {
    fn delay(&self, attempt: u32, base_delay: Duration) -> Duration {
        match self {
            Backoff::Constant => base_delay,
            Backoff::Linear => base_delay.saturating_mul(attempt),
            Backoff::Exponential => {
                let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                base_delay.saturating_mul(factor)
            }
            Backoff::Custom(f) => f(attempt),
        }
    }
}

/// A retry policy: how many attempts, how the delay between them grows, and
/// how much jitter to apply.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay fed to `backoff`.
    pub base_delay: Duration,
    /// Upper bound on the computed delay, before jitter.
    pub max_delay: Duration,
    /// Symmetric uniform jitter fraction applied to the delay, e.g. `0.1`
    /// jitters by ±10%.
    pub jitter_fraction: f64,
    /// Backoff shape.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter_fraction: 0.1,
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        let raw = self.backoff.delay(attempt, self.base_delay).min(self.max_delay);
        if self.jitter_fraction <= 0.0 {
            return raw;
        }
        let jitter_range = raw.as_secs_f64() * self.jitter_fraction;
        let offset = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
        let jittered = (raw.as_secs_f64() + offset).max(0.0);
        Duration::from_secs_f64(jittered)
    }
}

/// Errors from [`with_timeout`]/[`with_retry`].
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation did not complete within the deadline.
    #[error("operation timed out after {0:?}")]
    TimedOut(Duration),
    /// Every attempt failed; carries the last attempt's error.
    #[error("operation failed after all retry attempts: {0}")]
    Operation(E),
}

/// Race `op` against a timer; on timer win, return `TimedOut`.
pub async fn with_timeout<F, T, E>(duration: Duration, op: F) -> Result<T, RetryError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(duration, op).await {
        Ok(result) => result.map_err(RetryError::Operation),
        Err(_) => Err(RetryError::TimedOut(duration)),
    }
}

/// Run `make_op` (a factory, since a `Future` can only be awaited once) up
/// to `policy.max_attempts` times, sleeping between attempts per
/// `policy.backoff`. Returns the last error wrapped as `Operation` once
/// attempts are exhausted.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, mut make_op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match make_op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= policy.max_attempts {
                    return Err(RetryError::Operation(err));
                }
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_shapes_match_spec_formulas() {
        let base = Duration::from_millis(100);
        assert_eq!(Backoff::Constant.delay(5, base), base);
        assert_eq!(Backoff::Linear.delay(3, base), base * 3);
        assert_eq!(Backoff::Exponential.delay(3, base), base * 4);
    }

    #[tokio::test]
    async fn with_timeout_returns_timed_out_on_slow_op() {
        let result: Result<(), RetryError<()>> =
            with_timeout(Duration::from_millis(10), async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(RetryError::TimedOut(_))));
    }

    #[tokio::test]
    async fn with_retry_succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter_fraction: 0.0,
            backoff: Backoff::Constant,
        };

        let result: Result<&'static str, RetryError<&'static str>> = with_retry(&policy, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("not yet")
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn with_retry_gives_up_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter_fraction: 0.0,
            backoff: Backoff::Constant,
        };

        let result: Result<(), RetryError<&'static str>> =
            with_retry(&policy, || async { Err("always fails") }).await;

        assert!(matches!(result, Err(RetryError::Operation("always fails"))));
    }
}
