//! Exponential-backoff executor for the store update step.
//!
//! The policy is an explicit value handed to the executor, never global
//! state; tests run with zero jitter and millisecond budgets.

use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::sleep;
use tracing::debug;

/// Classifies errors for the retry executor.
pub trait RetryClass {
    /// Permanent errors short-circuit the retry loop immediately,
    /// regardless of remaining budget.
    fn is_permanent(&self) -> bool;
}

/// Backoff policy: doubling delay with jitter under an elapsed-time budget.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after every attempt.
    pub factor: f64,
    /// Random variation applied to each delay, as a fraction (0.5 = ±50%).
    pub jitter: f64,
    /// Total elapsed-time budget; the last error is returned once exceeded.
    pub max_elapsed: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            factor: 2.0,
            jitter: 0.5,
            max_elapsed: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    /// A fast policy for tests: tiny delays, no jitter, short budget.
    pub fn fast() -> Self {
        Self {
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            factor: 2.0,
            jitter: 0.0,
            max_elapsed: Duration::from_millis(250),
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return delay;
        }
        let spread = rand::thread_rng().gen_range(-self.jitter..=self.jitter);
        let millis = (delay.as_millis() as f64 * (1.0 + spread)).max(0.0) as u64;
        Duration::from_millis(millis)
    }
}

/// Runs `op` until it succeeds, returns a permanent error, or the elapsed
/// budget runs out; on exhaustion the last observed error is returned.
pub async fn apply_with_backoff<F, Fut, T, E>(policy: &BackoffPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + RetryClass,
{
    let started = Instant::now();
    let mut delay = policy.initial_delay;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_permanent() => return Err(err),
            Err(err) => {
                let elapsed = started.elapsed();
                if elapsed >= policy.max_elapsed {
                    return Err(err);
                }
                let pause = policy.jittered(delay.min(policy.max_delay));
                // Never sleep past the budget.
                let remaining = policy.max_elapsed - elapsed;
                debug!(attempt, error = %err, pause_ms = pause.as_millis() as u64, "retrying after transient error");
                sleep(pause.min(remaining)).await;
                delay = Duration::from_millis(
                    (delay.as_millis() as f64 * policy.factor) as u64,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("transient")]
        Transient,
        #[error("permanent")]
        Permanent,
    }

    impl RetryClass for TestError {
        fn is_permanent(&self) -> bool {
            matches!(self, Self::Permanent)
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result = apply_with_backoff(&BackoffPolicy::fast(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result = apply_with_backoff(&BackoffPolicy::fast(), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(TestError::Transient)
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn permanent_errors_short_circuit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = apply_with_backoff(&BackoffPolicy::fast(), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Permanent)
            }
        })
        .await;
        assert!(matches!(result.unwrap_err(), TestError::Permanent));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_budget_surfaces_the_last_error() {
        let result: Result<(), _> = apply_with_backoff(&BackoffPolicy::fast(), || async {
            Err(TestError::Transient)
        })
        .await;
        assert!(matches!(result.unwrap_err(), TestError::Transient));
    }
}
