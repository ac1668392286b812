//! Retry support for Stampede
//!
//! Used by callers that want to re-issue an operation which came back in a
//! transient state, such as polling a host whose execution is still running.

pub mod backoff;
pub mod retry;

pub use backoff::{BackoffCalculator, BackoffStrategy};
pub use retry::{RetryError, RetryExecutor, RetryPolicy, Retryable};
