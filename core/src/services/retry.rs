//! Retry policy and backoff for database probes and queries

use std::future::Future;
use std::time::Duration;

use rand::Rng;

/// How the delay grows between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// `base * factor^(attempt - 1)` plus up to `jitter` of random spread
    Exponential { factor: u32, jitter: Duration },
    /// `base * attempt`
    Linear,
}

/// Bounded retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
}

impl RetryPolicy {
    /// Startup connection probe: 3 attempts, delays of roughly 1s then 3s
    pub fn startup_probe() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(9000),
            strategy: BackoffStrategy::Exponential {
                factor: 3,
                jitter: Duration::from_millis(200),
            },
        }
    }

    /// Query execution: 2 attempts with linear backoff, or a single attempt
    pub fn query(retry_on_failure: bool) -> Self {
        Self {
            max_attempts: if retry_on_failure { 2 } else { 1 },
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(9000),
            strategy: BackoffStrategy::Linear,
        }
    }

    /// Delay after the given failed attempt (1-based) with a fixed jitter.
    pub fn delay_with_jitter(&self, attempt: u32, jitter: Duration) -> Duration {
        let attempt = attempt.max(1);
        let raw = match self.strategy {
            BackoffStrategy::Exponential { factor, .. } => {
                let multiplier = factor.saturating_pow(attempt - 1);
                self.base_delay.saturating_mul(multiplier) + jitter
            }
            BackoffStrategy::Linear => self.base_delay.saturating_mul(attempt),
        };
        raw.min(self.max_delay)
    }

    /// Delay after the given failed attempt, sampling the jitter
    pub fn compute_delay(&self, attempt: u32) -> Duration {
        let jitter = match self.strategy {
            BackoffStrategy::Exponential { jitter, .. } if !jitter.is_zero() => {
                let max_ms = jitter.as_millis() as u64;
                Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
            }
            _ => Duration::ZERO,
        };
        self.delay_with_jitter(attempt, jitter)
    }
}

/// A successful value and how many attempts it took
#[derive(Debug, Clone, PartialEq)]
pub struct Attempted<T> {
    pub value: T,
    pub attempts: u32,
}

/// The last error once retries stopped
#[derive(Debug, Clone, PartialEq)]
pub struct RetryError<E> {
    pub error: E,
    pub attempts: u32,
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up. The operation receives the 1-based
/// attempt number.
pub async fn with_retry<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<Attempted<T>, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return Ok(Attempted {
                    value,
                    attempts: attempt,
                })
            }
            Err(error) => {
                if attempt >= max_attempts || !is_retryable(&error) {
                    return Err(RetryError {
                        error,
                        attempts: attempt,
                    });
                }

                let delay = policy.compute_delay(attempt);
                tracing::debug!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after failed attempt"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
