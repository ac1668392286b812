//! Error types for plan execution

use stampede_core::PlanError;
use thiserror::Error;

/// Failures that abort a whole environment run. Recurrence-scoped failures
/// never surface here; they are counted in the executor result instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] PlanError),

    #[error("Executor {executor_id} failed: {message}")]
    ExecutorFailed { executor_id: usize, message: String },

    #[error("Execution was interrupted")]
    Interrupted,

    #[error("Invalid worker count: {0}")]
    InvalidWorkerCount(usize),
}
