//! Rate-limit aware retries.
//!
//! [`Retry::run`] drives an explicit state machine:
//!
//! ```text
//! Attempt ──ok──────────────────────────────▶ Success
//!    │ rate limited, attempts left
//!    ▼
//!  Wait(delay + jitter) ──▶ Attempt   (delay doubles each time)
//!    │ any other error, or attempts used up
//!    ▼
//!  Fatal(last error)
//! ```
//!
//! | attempt | un-jittered wait after it fails with 429 |
//! |---------|-------------------------------------------|
//! | 1       | 5 000 ms                                  |
//! | 2       | 10 000 ms                                 |
//! | 3       | 20 000 ms                                 |
//! | 4       | 40 000 ms                                 |
//! | 5       | none, the error is returned               |
//!
//! Waiting and randomness go through [`Sleeper`] and [`Jitter`] so tests
//! can run the schedule without real time passing.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::generator::GenerationError;

/// Errors that may be worth another attempt.
pub trait Retryable {
    fn should_retry(&self) -> bool;
}

impl Retryable for GenerationError {
    fn should_retry(&self) -> bool {
        self.is_rate_limited()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Upper bound (exclusive) of the random delay added to each wait.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(5000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(
        &self,
        duration: Duration,
    );
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(
        &self,
        duration: Duration,
    ) {
        tokio::time::sleep(duration).await;
    }
}

pub trait Jitter: Send + Sync {
    /// A random duration in `[0, max)`.
    fn jitter(
        &self,
        max: Duration,
    ) -> Duration;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RandJitter;

impl Jitter for RandJitter {
    fn jitter(
        &self,
        max: Duration,
    ) -> Duration {
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..max_ms))
    }
}

/// The error from the last attempt, and how many attempts were made.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempt(s): {source}")]
pub struct RetryError<E: std::error::Error + 'static> {
    pub attempts: u32,
    #[source]
    pub source: E,
}

/// Bookkeeping for one [`Retry::run`] invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState<E> {
    pub attempt: u32,
    pub delay: Duration,
    pub last_error: Option<E>,
}

impl<E> RetryState<E> {
    fn new(initial_delay: Duration) -> Self {
        Self {
            attempt: 0,
            delay: initial_delay,
            last_error: None,
        }
    }
}

enum Step<T, E> {
    Attempt,
    Wait(Duration),
    Success(T),
    Fatal(E),
}

pub struct Retry<'a> {
    policy: &'a RetryPolicy,
    sleeper: &'a dyn Sleeper,
    jitter: &'a dyn Jitter,
}

impl<'a> Retry<'a> {
    pub fn new(
        policy: &'a RetryPolicy,
        sleeper: &'a dyn Sleeper,
        jitter: &'a dyn Jitter,
    ) -> Self {
        Self {
            policy,
            sleeper,
            jitter,
        }
    }

    /// Call `operation` until it succeeds, fails with a non-retryable
    /// error, or `max_attempts` calls have been made.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        E: Retryable + std::error::Error + 'static,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut state = RetryState::new(self.policy.initial_delay);
        let mut step = Step::Attempt;

        loop {
            step = match step {
                Step::Attempt => {
                    state.attempt += 1;
                    match operation().await {
                        Ok(value) => Step::Success(value),
                        Err(err) if err.should_retry() && state.attempt < max_attempts => {
                            let wait = state.delay + self.jitter.jitter(self.policy.max_jitter);
                            state.last_error = Some(err);
                            Step::Wait(wait)
                        }
                        Err(err) => Step::Fatal(err),
                    }
                }
                Step::Wait(wait) => {
                    warn!(
                        operation = operation_name,
                        attempt = state.attempt,
                        max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %DisplayLast(&state.last_error),
                        "Rate limited, will retry after backoff"
                    );
                    self.sleeper.sleep(wait).await;
                    state.delay = state.delay.saturating_mul(2);
                    Step::Attempt
                }
                Step::Success(value) => {
                    if state.attempt > 1 {
                        debug!(
                            operation = operation_name,
                            attempt = state.attempt,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Step::Fatal(err) => {
                    error!(
                        operation = operation_name,
                        attempt = state.attempt,
                        retryable = err.should_retry(),
                        error = %err,
                        "Operation failed"
                    );
                    return Err(RetryError {
                        attempts: state.attempt,
                        source: err,
                    });
                }
            };
        }
    }
}

struct DisplayLast<'e, E>(&'e Option<E>);

impl<E: fmt::Display> fmt::Display for DisplayLast<'_, E> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.0 {
            Some(err) => err.fmt(f),
            None => f.write_str("none"),
        }
    }
}
