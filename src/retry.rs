//! Bounded retry schedules.
//!
//! A [`RetryPolicy`] is a fixed list of delays: attempt `n + 1` runs after the
//! `n`th delay has elapsed. The same combinator drives every retried
//! operation, so the schedule can be exercised with paused Tokio time.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Returned when every scheduled attempt failed.
#[derive(Debug, Error)]
#[error("{operation} failed after {attempts} attempts: {last_error}")]
pub struct RetriesExhausted<E: std::error::Error> {
    /// Name of the retried operation.
    pub operation: String,
    /// Number of attempts made.
    pub attempts: u32,
    /// Error from the final attempt.
    pub last_error: E,
}

/// A fixed schedule of attempts and the delays between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    /// Runs once with no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self { delays: Vec::new() }
    }

    /// Makes `attempts` attempts with `delay` between consecutive ones.
    ///
    /// Zero attempts is treated as one.
    #[must_use]
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        let retries = attempts.saturating_sub(1);
        Self {
            delays: (0..retries).map(|_| delay).collect(),
        }
    }

    /// Total number of attempts, including the first.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        u32::try_from(self.delays.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// Yields `(attempt, delay)` pairs, where `delay` is the pause taken
    /// before `attempt` (1-based). The first attempt has no delay.
    pub fn schedule(&self) -> impl Iterator<Item = (u32, Duration)> + '_ {
        std::iter::once(Duration::ZERO)
            .chain(self.delays.iter().copied())
            .zip(1_u32..)
            .map(|(delay, attempt)| (attempt, delay))
    }

    /// Runs `operation` until it succeeds or the schedule is exhausted.
    ///
    /// The closure receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns [`RetriesExhausted`] carrying the final attempt's error.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: &str,
        mut attempt_fn: F,
    ) -> Result<T, RetriesExhausted<E>>
    where
        E: std::error::Error,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let total = self.attempts();
        let mut attempts = 1;
        let mut last_error = match attempt_fn(attempts).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        for (attempt, delay) in self.schedule().skip(1) {
            tracing::warn!(
                operation,
                attempt = attempts,
                total,
                retry_in = ?delay,
                error = %last_error,
                "attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempts = attempt;
            last_error = match attempt_fn(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
        }

        Err(RetriesExhausted {
            operation: operation.to_owned(),
            attempts,
            last_error,
        })
    }
}
