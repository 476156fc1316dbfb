//! Rolling-window rate limiter for upstream calls.
//!
//! Admits at most `max_calls` calls in any trailing `window`. Callers over
//! quota are suspended until the oldest admitted call leaves the window,
//! plus a little jitter so waiters do not wake in lockstep.

use market_core::error::RateLimitError;
use rand::Rng;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Calls admitted per window
    pub max_calls: usize,
    /// Length of the trailing window
    pub window: Duration,
    /// Upper bound of the random delay added to each wait
    pub max_jitter: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 25,
            window: Duration::from_secs(60 * 60),
            max_jitter: Duration::from_millis(500),
        }
    }
}

/// Shared admission control for all upstream calls of a process.
pub struct RateLimiter {
    calls: Mutex<VecDeque<Instant>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let config = RateLimitConfig {
            max_calls: config.max_calls.max(1),
            ..config
        };
        Self {
            calls: Mutex::new(VecDeque::with_capacity(config.max_calls)),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.calls.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Drop admissions that have left the window.
    fn prune(&self, calls: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = calls.front() {
            if now.duration_since(oldest) >= self.config.window {
                calls.pop_front();
            } else {
                break;
            }
        }
    }

    /// Admit now if under quota, otherwise report the wait until a slot frees.
    fn try_admit(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut calls = self.lock();
        self.prune(&mut calls, now);

        if calls.len() < self.config.max_calls {
            calls.push_back(now);
            return Ok(());
        }

        // Non-empty here since max_calls >= 1
        let oldest = calls.front().copied().unwrap_or(now);
        Err((oldest + self.config.window).saturating_duration_since(now))
    }

    fn jitter(&self) -> Duration {
        let max = self.config.max_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }

    /// Wait for a call slot and take it.
    ///
    /// Dropping the future abandons the wait without taking a slot.
    pub async fn acquire(&self) {
        loop {
            let wait = match self.try_admit() {
                Ok(()) => return,
                Err(wait) => wait + self.jitter(),
            };

            debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Like [`acquire`](Self::acquire), but give up when no slot frees
    /// within `max_wait`.
    pub async fn acquire_within(&self, max_wait: Duration) -> Result<(), RateLimitError> {
        let deadline = Instant::now() + max_wait;

        loop {
            let available_in = match self.try_admit() {
                Ok(()) => return Ok(()),
                Err(wait) => wait,
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            if available_in > remaining {
                return Err(RateLimitError::WaitExceeded {
                    max_wait,
                    available_in,
                });
            }

            tokio::time::sleep((available_in + self.jitter()).min(remaining)).await;
        }
    }

    /// Take a slot only if one is free right now.
    pub fn try_acquire(&self) -> bool {
        self.try_admit().is_ok()
    }

    /// Time until a slot frees, zero if one is free now.
    pub fn time_until_available(&self) -> Duration {
        let now = Instant::now();
        let mut calls = self.lock();
        self.prune(&mut calls, now);

        if calls.len() < self.config.max_calls {
            return Duration::ZERO;
        }
        calls
            .front()
            .map(|&oldest| (oldest + self.config.window).saturating_duration_since(now))
            .unwrap_or_default()
    }

    /// Number of calls admitted within the current window.
    pub fn in_window(&self) -> usize {
        let now = Instant::now();
        let mut calls = self.lock();
        self.prune(&mut calls, now);
        calls.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(3600);

    fn limiter(max_calls: usize) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            max_calls,
            window: WINDOW,
            max_jitter: Duration::from_millis(100),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_admits_quota_without_waiting() {
        let limiter = limiter(3);
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.in_window(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_over_quota_waits_for_window() {
        let limiter = limiter(3);
        let start = Instant::now();

        for _ in 0..4 {
            limiter.acquire().await;
        }

        let waited = start.elapsed();
        assert!(waited >= WINDOW, "waited {waited:?}");
        assert!(waited <= WINDOW + Duration::from_millis(100));
        assert_eq!(limiter.in_window(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_exceeds_quota_in_any_window() {
        let limiter = Arc::new(limiter(5));
        let admitted = Arc::new(Mutex::new(Vec::new()));

        let tasks: Vec<_> = (0..17)
            .map(|_| {
                let limiter = limiter.clone();
                let admitted = admitted.clone();
                tokio::spawn(async move {
                    limiter.acquire().await;
                    admitted.lock().unwrap().push(Instant::now());
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut times = admitted.lock().unwrap().clone();
        times.sort();
        assert_eq!(times.len(), 17);
        for (i, &t) in times.iter().enumerate() {
            let in_window = times[i..].iter().filter(|&&u| u - t < WINDOW).count();
            assert!(in_window <= 5, "{in_window} calls within one window");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_acquire_and_time_until_available() {
        let limiter = limiter(2);

        assert_eq!(limiter.time_until_available(), Duration::ZERO);
        assert!(limiter.try_acquire());
        tokio::time::advance(Duration::from_secs(600)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        assert_eq!(limiter.time_until_available(), WINDOW - Duration::from_secs(600));
        assert_eq!(limiter.in_window(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_within_gives_up() {
        let limiter = limiter(1);
        limiter.acquire().await;

        let err = limiter
            .acquire_within(Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RateLimitError::WaitExceeded {
                max_wait: Duration::from_secs(60),
                available_in: WINDOW,
            }
        );

        assert!(limiter.acquire_within(WINDOW * 2).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_wait_takes_no_slot() {
        let limiter = limiter(1);
        limiter.acquire().await;

        let abandoned =
            tokio::time::timeout(Duration::from_secs(5), limiter.acquire()).await;
        assert!(abandoned.is_err());
        assert_eq!(limiter.in_window(), 1);
    }

    #[test]
    fn test_zero_quota_is_clamped() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_calls: 0,
            ..RateLimitConfig::default()
        });
        assert_eq!(limiter.config().max_calls, 1);
    }
}
