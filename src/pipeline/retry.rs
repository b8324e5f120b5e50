//! Retry with exponential backoff.
//!
//! Every error is retried the same way; there is no retryable/non-retryable
//! split and no jitter. The delay after failed attempt `n` (0-based) is
//! `base_delay * 2^n`, so the defaults (2 retries, 1 s base) wait 1 s then
//! 2 s. When retries run out the last error is handed back unchanged.
//!
//! Both the operation and the backoff sleep are raced against a
//! [`CancelToken`], so a cancelled run never waits out a delay.

use crate::cancel::CancelToken;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// How many times to retry and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(1000))
    }
}

/// Why [`run`] gave up.
#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed; `last` is the final attempt's error.
    Exhausted { attempts: u32, last: E },
    Cancelled,
}

/// Run `op` until it succeeds, retries run out, or `cancel` fires.
///
/// `op` receives the 0-based attempt number. `on_retry` is called after each
/// failure that will be retried, with the 1-based number of the failed
/// attempt, the delay about to be slept, and the error.
pub async fn run<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    cancel: &CancelToken,
    mut op: F,
    mut on_retry: R,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(u32, Duration, &E),
{
    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            r = op(attempt) => r,
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(last) if attempt >= policy.max_retries => {
                return Err(RetryError::Exhausted {
                    attempts: attempt + 1,
                    last,
                });
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                on_retry(attempt + 1, delay, &e);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RetryError::Cancelled),
                    _ = sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    }
}
