//! Exponential backoff for upstream calls that hit rate limits.
//!
//! Only throttling errors are retried. Anything else fails on the first
//! attempt, and a throttle that outlasts every attempt surfaces as
//! [`RetryError::Exhausted`].

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use thiserror::Error;

/// Total attempts, including the first call.
pub const DEFAULT_MAX_ATTEMPTS: usize = 6;

/// Delay before the first retry; doubles on each subsequent one.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(5);

/// Backoff schedule for the retry executor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first call (minimum 1).
    pub max_attempts: usize,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth factor between consecutive delays.
    pub factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            factor: 2.0,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            ..Self::default()
        }
    }

    /// Delay slept after the `attempt`-th failure (1-based).
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as usize) as i32;
        self.base_delay.mul_f64(f64::from(self.factor).powi(exp))
    }

    /// Build the backon strategy: `max_attempts - 1` sleeps, no jitter, and
    /// a ceiling high enough that no delay in the schedule is clamped.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let retries = self.max_attempts.max(1) - 1;
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_factor(self.factor)
            .with_max_delay(self.delay_after(retries.max(1)))
            .with_max_times(retries)
    }
}

/// Outcome of a call that did not succeed.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every attempt was rate limited.
    #[error("max retries exceeded after {attempts} attempts: {last}")]
    Exhausted { attempts: usize, last: E },

    /// A non-retryable error on some attempt.
    #[error(transparent)]
    Failed(E),
}

impl<E> RetryError<E> {
    /// The underlying error of the final attempt.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { last, .. } => last,
            RetryError::Failed(e) => e,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }
}

/// Run `operation`, retrying while `is_retryable` holds.
///
/// With the default schedule the sleeps between the six attempts are
/// 5, 10, 20, 40 and 80 seconds. Unlike a schedule that also waits 160 s
/// after the sixth failure, exhaustion is returned immediately.
///
/// # Example
///
/// ```ignore
/// let detail = with_backoff(
///     &RetryConfig::default(),
///     "artwork 42",
///     || api.get_artwork(42),
///     UpstreamError::is_rate_limited,
/// )
/// .await?;
/// ```
pub async fn with_backoff<T, E, F, Fut, P>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let attempt = AtomicUsize::new(0);

    let result = (|| {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    })
    .retry(config.into_backoff())
    .sleep(tokio::time::sleep)
    .when(|e| is_retryable(e))
    .notify(|err, delay| {
        tracing::debug!(
            label,
            attempt = attempt.load(Ordering::SeqCst),
            delay_ms = delay.as_millis() as u64,
            "Rate limited, backing off: {}",
            err
        );
    })
    .await;

    match result {
        Ok(value) => Ok(value),
        Err(e) if is_retryable(&e) => {
            let attempts = attempt.load(Ordering::SeqCst);
            tracing::warn!(label, attempts, "Giving up after repeated rate limiting");
            Err(RetryError::Exhausted { attempts, last: e })
        }
        Err(e) => Err(RetryError::Failed(e)),
    }
}
