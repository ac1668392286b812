//! Caller-level retry of polls that come back pending

use async_trait::async_trait;
use stampede_config::PollRetryConfig;
use stampede_core::{
    DispatchError, ExecuteRequest, PlanEnvironmentResult, PollError, PollResponse,
    RemoteEnvironment, ResultId,
};
use stampede_resilience::{RetryExecutor, RetryPolicy, Retryable};
use std::fmt;
use std::time::Duration;

/// Exponential policy built from the `saturation.poll_retry` settings
pub fn poll_retry_policy(config: &PollRetryConfig) -> RetryPolicy {
    RetryPolicy::exponential(
        config.max_attempts,
        Duration::from_millis(config.initial_delay_ms),
        Duration::from_millis(config.max_delay_ms),
        config.backoff_multiplier,
    )
}

enum PollAttempt {
    Pending,
    Failed(PollError),
}

impl fmt::Display for PollAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollAttempt::Pending => f.write_str("execution still pending"),
            PollAttempt::Failed(error) => write!(f, "{}", error),
        }
    }
}

impl Retryable for PollAttempt {
    fn is_retryable(&self) -> bool {
        matches!(self, PollAttempt::Pending)
    }
}

/// Wraps a remote so `poll` keeps asking while the host reports pending.
///
/// Dispatch is passed through unchanged. When the policy runs out of
/// attempts the last `Pending` is returned to the caller.
#[derive(Debug, Clone)]
pub struct RetryingRemote<R> {
    inner: R,
    executor: RetryExecutor,
}

impl<R: RemoteEnvironment> RetryingRemote<R> {
    pub fn new(inner: R, policy: RetryPolicy) -> Self {
        Self {
            inner,
            executor: RetryExecutor::new(policy),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: RemoteEnvironment> RemoteEnvironment for RetryingRemote<R> {
    async fn dispatch(&self, host: &str, request: &ExecuteRequest) -> Result<ResultId, DispatchError> {
        self.inner.dispatch(host, request).await
    }

    async fn poll(&self, host: &str, result_id: &ResultId) -> Result<PollResponse, PollError> {
        let inner = &self.inner;
        let outcome = self
            .executor
            .execute(|| async move {
                match inner.poll(host, result_id).await {
                    Ok(PollResponse::Completed(result)) => Ok::<PlanEnvironmentResult, _>(result),
                    Ok(PollResponse::Pending) => Err(PollAttempt::Pending),
                    Err(error) => Err(PollAttempt::Failed(error)),
                }
            })
            .await;

        match outcome {
            Ok(result) => Ok(PollResponse::Completed(result)),
            Err(error) => match error.into_inner() {
                PollAttempt::Pending => Ok(PollResponse::Pending),
                PollAttempt::Failed(error) => Err(error),
            },
        }
    }
}
