//! Fixed-delay retry for calls through the execution channel.
//!
//! Every external call the job makes is retried at a steady cadence rather
//! than with backoff: the monitoring stack either comes up within seconds or
//! the job should give up.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

/// How often and how long to retry a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRetry {
    /// Delay between attempts.
    pub delay: Duration,
    /// Maximum number of attempts (None = retry until success or a fatal error).
    pub max_attempts: Option<u32>,
}

impl FixedRetry {
    /// Retry at most `max_attempts` times.
    #[must_use]
    pub const fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: Some(max_attempts),
        }
    }

    /// Retry until the call succeeds or fails fatally.
    #[must_use]
    pub const fn unbounded(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: None,
        }
    }

    /// Whether another attempt is allowed after `attempt` attempts have failed.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempt < max,
            None => true,
        }
    }
}

/// Why a retried call gave up.
#[derive(Debug, Error)]
pub enum RetryError<E: fmt::Display> {
    /// The call failed in a way retrying cannot fix.
    #[error("{0}")]
    Fatal(E),

    /// Every allowed attempt failed.
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        last: E,
    },
}

/// Run `call` until it succeeds, fails fatally, or the policy is exhausted.
///
/// `is_transient` decides whether an error is worth another attempt. Each
/// failed attempt is logged with its attempt number.
pub async fn retry_fixed<F, Fut, T, E>(
    policy: &FixedRetry,
    operation: &str,
    is_transient: impl Fn(&E) -> bool,
    mut call: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if !is_transient(&e) => return Err(RetryError::Fatal(e)),
            Err(e) => {
                if !policy.should_retry(attempt) {
                    return Err(RetryError::Exhausted { attempts: attempt, last: e });
                }
                warn!(operation, attempt, error = %e, "attempt failed, retrying");
                sleep(policy.delay).await;
            }
        }
    }
}
