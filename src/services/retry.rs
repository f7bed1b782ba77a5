//! Bounded retry on upstream rate limiting.
//!
//! Only [`ProviderError::RateLimited`] is retried. Every other error ends the
//! loop immediately, and the number of attempts is always bounded.

use std::future::Future;
use std::time::Duration;

use crate::providers::marketing::ProviderError;

/// Exponential backoff schedule: `base * 2^attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
}

impl Backoff {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    /// Delay to wait after the zero-based `attempt` was rate limited.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// How a rate-limit aware fetch ended.
#[derive(Debug, PartialEq)]
pub enum RetryOutcome<T> {
    /// The call eventually succeeded.
    Success(T),
    /// Every attempt was rate limited.
    Exhausted { attempts: u32 },
    /// A non rate-limit error ended the loop.
    Failed(ProviderError),
}

/// Runs `call` up to `max_attempts` times, backing off on rate limits.
///
/// `on_retry(attempt, wait)` fires before each backoff sleep. No sleep
/// follows the final attempt. A `max_attempts` of zero still makes one call.
pub async fn retry_on_rate_limit<T, F, Fut, N>(
    max_attempts: u32,
    backoff: Backoff,
    mut call: F,
    mut on_retry: N,
) -> RetryOutcome<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
    N: FnMut(u32, Duration),
{
    let max_attempts = max_attempts.max(1);

    for attempt in 0..max_attempts {
        match call().await {
            Ok(value) => return RetryOutcome::Success(value),
            Err(e) if e.is_rate_limited() => {
                if attempt + 1 >= max_attempts {
                    break;
                }
                let wait = backoff.delay(attempt);
                on_retry(attempt, wait);
                tokio::time::sleep(wait).await;
            }
            Err(e) => return RetryOutcome::Failed(e),
        }
    }

    RetryOutcome::Exhausted {
        attempts: max_attempts,
    }
}
