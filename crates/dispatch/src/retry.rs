//! Bounded retries with backoff for transient backend failures.
//!
//! Only errors the caller marks retryable are retried; anything else returns
//! after the attempt that produced it.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// `base_delay * n` after the n-th failed attempt.
    #[default]
    Linear,
    /// `base_delay * 2^(n-1)` after the n-th failed attempt.
    Exponential,
}

/// Retry policy for one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    #[serde(rename = "base_delay_ms", with = "crate::serde_millis")]
    pub base_delay: Duration,
    #[serde(rename = "max_delay_ms", with = "crate::serde_millis")]
    pub max_delay: Duration,
    pub strategy: BackoffStrategy,
    /// Add up to 50% random extra delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(2000),
            max_delay: Duration::from_secs(30),
            strategy: BackoffStrategy::Linear,
            jitter: false,
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_strategy(mut self, strategy: BackoffStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Wait before the attempt following failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let base = self.base_delay.as_millis() as u64;
        let raw = match self.strategy {
            BackoffStrategy::Linear => base.saturating_mul(u64::from(attempt)),
            BackoffStrategy::Exponential => {
                base.saturating_mul(1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX))
            }
        };
        let capped = raw.min(self.max_delay.as_millis() as u64);

        if self.jitter {
            Duration::from_millis(capped + fastrand::u64(0..=capped / 2))
        } else {
            Duration::from_millis(capped)
        }
    }
}

/// What happened across all attempts.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Attempts actually made (1 means no retry was needed).
    pub attempts: u32,
    pub total_duration: Duration,
    /// True when the final error was retryable but the attempt budget ran out.
    pub exhausted: bool,
}

impl<T, E> RetryOutcome<T, E> {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `operation` (given the 1-based attempt number) until it succeeds,
/// fails with a non-retryable error, or the attempt budget is spent.
pub async fn retry_async<T, E, F, Fut, R>(
    config: &RetryConfig,
    is_retryable: R,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let started = Instant::now();
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match operation(attempt).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt,
                    total_duration: started.elapsed(),
                    exhausted: false,
                };
            }
            Err(error) => error,
        };

        let retryable = is_retryable(&error);
        if !retryable || attempt >= max_attempts {
            return RetryOutcome {
                result: Err(error),
                attempts: attempt,
                total_duration: started.elapsed(),
                exhausted: retryable,
            };
        }

        let delay = config.delay_after(attempt);
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
