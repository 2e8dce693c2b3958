//! Retry with linear backoff for upstream requests.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How many times to try a request and how long to wait in between.
///
/// The wait before attempt `n + 1` is `base_delay * n`; there is no wait
/// after the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Hourly air-quality data: 3 attempts, 1s/2s backoff.
    pub fn air_quality() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }

    /// Reference cities are best-effort: 2 attempts.
    pub fn cities() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(1000),
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// A successful value together with the attempt that produced it (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Runs `operation` until it succeeds or the policy's attempts are used up.
///
/// The closure receives the 1-based attempt number. When every attempt
/// fails the last error is returned.
pub async fn fetch_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<Retried<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation(attempt).await {
            Ok(value) => {
                debug!("{} succeeded on attempt {}/{}", label, attempt, max_attempts);
                return Ok(Retried {
                    value,
                    attempts: attempt,
                });
            },
            Err(e) if attempt >= max_attempts => {
                warn!("{} failed after {} attempts: {}", label, attempt, e);
                return Err(e);
            },
            Err(e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "{} attempt {}/{} failed: {}. Retrying in {:?}",
                    label, attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
        }
    }
}
