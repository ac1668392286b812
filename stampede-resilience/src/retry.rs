//! Retry policy and executor

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::backoff::{BackoffCalculator, BackoffStrategy};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,

    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    pub backoff_strategy: BackoffStrategy,

    /// Whether to add jitter to retry delays
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_strategy: BackoffStrategy::Exponential { base: 2.0 },
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Exponential policy without jitter
    pub fn exponential(
        max_attempts: u32,
        initial_delay: Duration,
        max_delay: Duration,
        base: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            backoff_strategy: BackoffStrategy::Exponential { base },
            jitter: false,
        }
    }

    /// Constant delay between attempts
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            backoff_strategy: BackoffStrategy::Fixed,
            jitter: false,
        }
    }

    /// Calculate delay for a specific attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        BackoffCalculator::new(
            self.backoff_strategy.clone(),
            self.initial_delay,
            self.max_delay,
            self.jitter,
        )
        .calculate_delay(attempt)
    }
}

/// Trait for errors that can be retried
pub trait Retryable {
    /// Whether this error is retryable
    fn is_retryable(&self) -> bool;

    /// Delay requested by the error itself, overriding the policy
    fn retry_delay(&self) -> Option<Duration> {
        None
    }
}

/// Runs an async operation until it succeeds, fails permanently, or runs
/// out of attempts
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn with_default_policy() -> Self {
        Self::new(RetryPolicy::default())
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute a function with retry logic
    pub async fn execute<F, Fut, T, E>(&self, mut f: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + fmt::Display,
    {
        self.execute_with_context(|_attempt| f()).await
    }

    /// Execute a function with retry logic, passing the 1-indexed attempt
    pub async fn execute_with_context<F, Fut, T, E>(&self, mut f: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + fmt::Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!("Executing attempt {} of {}", attempt, max_attempts);

            let error = match f(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("Operation succeeded after {} attempts", attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                warn!("Operation failed with non-retryable error: {}", error);
                return Err(RetryError::NonRetryableError(error));
            }

            if attempt >= max_attempts {
                warn!("Operation failed after {} attempts: {}", attempt, error);
                return Err(RetryError::MaxAttemptsExceeded {
                    attempts: attempt,
                    last_error: error,
                });
            }

            let delay = error
                .retry_delay()
                .unwrap_or_else(|| self.policy.delay_for_attempt(attempt));
            debug!("Attempt {} failed: {}. Retrying in {:?}", attempt, error, delay);
            sleep(delay).await;

            attempt += 1;
        }
    }
}

/// Retry error types
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("Maximum retry attempts ({attempts}) exceeded. Last error: {last_error}")]
    MaxAttemptsExceeded { attempts: u32, last_error: E },

    #[error("Non-retryable error: {0}")]
    NonRetryableError(E),
}

impl<E> RetryError<E> {
    /// The error returned by the last attempt
    pub fn into_inner(self) -> E {
        match self {
            RetryError::MaxAttemptsExceeded { last_error, .. } => last_error,
            RetryError::NonRetryableError(error) => error,
        }
    }

    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::MaxAttemptsExceeded { attempts, .. } => Some(*attempts),
            RetryError::NonRetryableError(_) => None,
        }
    }
}
