//! Retry policy for model calls.
//!
//! Backoff after the n-th failed attempt is `multiplier * 2^(n-1)` seconds,
//! clamped to `[min_backoff, max_backoff]`. A rate-limit failure additionally
//! pauses for `rate_limit_pause` before the backoff applies.

use std::future::Future;
use std::time::Duration;

use super::LlmError;

const MAX_ATTEMPTS: u32 = 3;
const MIN_BACKOFF: Duration = Duration::from_secs(4);
const MAX_BACKOFF: Duration = Duration::from_secs(10);
const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub multiplier: f64,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub rate_limit_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            multiplier: 1.0,
            min_backoff: MIN_BACKOFF,
            max_backoff: MAX_BACKOFF,
            rate_limit_pause: RATE_LIMIT_PAUSE,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `attempt` (1-based) has failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        let raw = self.multiplier * 2f64.powi(exponent);
        let floor = self.min_backoff.as_secs_f64();
        let ceiling = self.max_backoff.as_secs_f64().max(floor);
        Duration::from_secs_f64(raw.clamp(floor, ceiling))
    }

    /// Runs `op` until it succeeds or the attempt budget is spent.
    ///
    /// `on_failure` sees every failed attempt before any waiting happens. The
    /// error from the final attempt is returned unchanged.
    pub async fn run<T, F, Fut, L>(&self, mut op: F, mut on_failure: L) -> Result<T, LlmError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
        L: FnMut(u32, &LlmError),
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    on_failure(attempt, &err);

                    if err.is_rate_limited() {
                        tokio::time::sleep(self.rate_limit_pause).await;
                    }

                    if attempt >= max_attempts {
                        return Err(err);
                    }

                    tokio::time::sleep(self.backoff(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;

    #[test]
    fn test_backoff_floor_and_ceiling() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(8));
        assert_eq!(policy.backoff(5), Duration::from_secs(10));
        assert_eq!(policy.backoff(40), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_twice_then_succeeds() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let mut failures = Vec::new();
        let started = Instant::now();

        let result = policy
            .run(
                |_| {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if n < 3 {
                            Err(LlmError::EmptyContent)
                        } else {
                            Ok("done")
                        }
                    }
                },
                |attempt, _| failures.push(attempt),
            )
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(failures, vec![1, 2]);
        // two backoffs at the 4s floor
        assert!(started.elapsed() >= Duration::from_secs(8));
        assert!(started.elapsed() < Duration::from_secs(9));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_propagates_after_three_attempts() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<(), LlmError> = policy
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async {
                        Err(LlmError::Api {
                            status: 500,
                            message: "upstream down".to_string(),
                        })
                    }
                },
                |_, _| {},
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(LlmError::Api { status, .. }) => assert_eq!(status, 500),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_adds_pause_on_top_of_backoff() {
        let policy = RetryPolicy::default();
        let started = Instant::now();

        let result: Result<(), LlmError> = policy
            .run(
                |_| async { Err(LlmError::RateLimited("slow down".to_string())) },
                |_, _| {},
            )
            .await;

        assert!(result.unwrap_err().is_rate_limited());
        // 3 pauses of 2s plus 2 backoffs of 4s
        assert!(started.elapsed() >= Duration::from_secs(14));
        assert!(started.elapsed() < Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_single_attempt_budget() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        let calls = AtomicU32::new(0);

        let result: Result<(), LlmError> = policy
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(LlmError::EmptyContent) }
                },
                |_, _| {},
            )
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
