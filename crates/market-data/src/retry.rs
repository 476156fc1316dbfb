//! Bounded retry with exponential, jittered backoff.

use market_core::error::ProviderError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Outcome of a single upstream attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt<T> {
    Success(T),
    /// May succeed if tried again
    Retryable(ProviderError),
    /// Trying again will not help
    Fatal(ProviderError),
}

impl<T> From<Result<T, ProviderError>> for Attempt<T> {
    fn from(result: Result<T, ProviderError>) -> Self {
        match result {
            Ok(value) => Attempt::Success(value),
            Err(e) if e.is_retryable() => Attempt::Retryable(e),
            Err(e) => Attempt::Fatal(e),
        }
    }
}

/// Why a retried operation gave up.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryFailure {
    pub attempts: u32,
    pub last_error: ProviderError,
    /// Stopped on a non-retryable error rather than exhausting the budget
    pub fatal: bool,
}

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay after the first failed attempt, doubled after each further one
    pub base_delay: Duration,
    /// Upper bound on a single delay, jitter included
    pub max_delay: Duration,
    /// No sleep may end later than this after the first attempt started
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            max_elapsed: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `failed + 1`, without jitter.
    pub fn base_backoff(&self, failed: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Delay before attempt `failed + 1`: base backoff plus up to half of it
    /// again at random, capped at `max_delay`.
    pub fn backoff(&self, failed: u32) -> Duration {
        let base = self.base_backoff(failed);
        let spread = (base.as_millis() / 2) as u64;
        let jitter = if spread == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=spread)
        };
        (base + Duration::from_millis(jitter)).min(self.max_delay)
    }

    /// Run `op` until it succeeds, fails fatally or the budget runs out.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, RetryFailure>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        let started = Instant::now();
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match op(attempt).await {
                Attempt::Success(value) => return Ok(value),
                Attempt::Fatal(error) => {
                    warn!(attempt, error = %error, "Upstream call failed, not retrying");
                    return Err(RetryFailure {
                        attempts: attempt,
                        last_error: error,
                        fatal: true,
                    });
                }
                Attempt::Retryable(error) => error,
            };

            if attempt >= max_attempts {
                warn!(attempt, error = %error, "Upstream call failed, attempts exhausted");
                return Err(RetryFailure {
                    attempts: attempt,
                    last_error: error,
                    fatal: false,
                });
            }

            let delay = self.backoff(attempt);
            if started.elapsed() + delay > self.max_elapsed {
                warn!(attempt, error = %error, "Upstream call failed, retry budget spent");
                return Err(RetryFailure {
                    attempts: attempt,
                    last_error: error,
                    fatal: false,
                });
            }

            debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Upstream call failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn network() -> ProviderError {
        ProviderError::Network("connection reset".into())
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.base_backoff(1), Duration::from_secs(1));
        assert_eq!(policy.base_backoff(2), Duration::from_secs(2));
        assert_eq!(policy.base_backoff(3), Duration::from_secs(4));
        assert_eq!(policy.base_backoff(10), Duration::from_secs(8));
        assert_eq!(policy.base_backoff(u32::MAX), Duration::from_secs(8));

        for failed in 1..6 {
            let delay = policy.backoff(failed);
            assert!(delay >= policy.base_backoff(failed));
            assert!(delay <= policy.max_delay);
        }
    }

    #[test]
    fn test_attempt_from_result() {
        assert_eq!(Attempt::from(Ok::<_, ProviderError>(1)), Attempt::Success(1));
        assert_eq!(
            Attempt::<()>::from(Err(network())),
            Attempt::Retryable(network())
        );
        let rejected = ProviderError::Rejected("Invalid API call".into());
        assert_eq!(
            Attempt::<()>::from(Err(rejected.clone())),
            Attempt::Fatal(rejected)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = RetryPolicy::default()
            .run(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Attempt::Retryable(network())
                    } else {
                        Attempt::Success(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let start = Instant::now();
        let result: Result<(), _> = RetryPolicy::default()
            .run(|_| async { Attempt::Retryable(network()) })
            .await;

        let failure = result.unwrap_err();
        assert_eq!(failure.attempts, 3);
        assert!(!failure.fatal);
        // Slept after attempts 1 and 2 only
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() <= Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::default()
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Attempt::Fatal(ProviderError::Rejected("bad symbol".into())) }
            })
            .await;

        let failure = result.unwrap_err();
        assert!(failure.fatal);
        assert_eq!(failure.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_budget_stops_early() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            max_elapsed: Duration::from_secs(5),
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Attempt::Retryable(network()) }
            })
            .await;

        // 2-3s after the first failure, then 4-6s would pass the budget
        assert_eq!(result.unwrap_err().attempts, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
