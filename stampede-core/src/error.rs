//! Core error types for Stampede
//!
//! Errors are split by the scope at which they are recovered: plan
//! construction errors are fatal to the enclosing build, recurrence errors
//! fail a single recurrence, and dispatch/poll errors fail a single host in
//! a saturation round.

use thiserror::Error;

/// Invalid or missing configuration detected while building a plan or
/// preparing an execution. Never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("Plan '{0}' does not declare an initial activity")]
    MissingInitialActivity(String),

    #[error("Initial activity '{0}' is not defined in the plan")]
    UnknownInitialActivity(String),

    #[error("Activity name '{0}' is reserved as the terminal marker")]
    ReservedActivityName(String),

    #[error("Activity '{0}' is defined more than once")]
    DuplicateActivity(String),

    #[error("Activity '{name}' uses unknown activity type '{class_name}'")]
    UnknownActivityType { name: String, class_name: String },

    #[error("Invalid configuration for activity '{activity}': {message}")]
    InvalidActivityConfig { activity: String, message: String },

    #[error("Recurrence type '{0}' is not supported, only count-based recurrences can be executed")]
    UnsupportedRecurrenceType(String),

    #[error("Failed to parse plan definition: {0}")]
    Parse(String),
}

impl PlanError {
    /// Shorthand for activity factories rejecting their configuration
    pub fn invalid_config(activity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidActivityConfig {
            activity: activity.into(),
            message: message.into(),
        }
    }
}

/// Raised by an activity during `execute`
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Activity '{activity}' failed: {message}")]
pub struct ActivityExecutionError {
    pub activity: String,
    pub message: String,
}

impl ActivityExecutionError {
    pub fn new(activity: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            activity: activity.into(),
            message: message.into(),
        }
    }
}

/// Variable pattern syntax errors and accessor lookup failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VariableEvaluationError {
    #[error("Variable pattern is empty")]
    EmptyPattern,

    #[error("Variable pattern '{0}' must start with 'run.' or 'global.'")]
    MissingPrefix(String),

    #[error("Variable pattern '{0}' is malformed, expected ${{run.<name>[.<attr>]*}}")]
    MalformedPattern(String),

    #[error("Accessor '{accessor}' does not exist on type '{type_name}'")]
    MissingAccessor { accessor: String, type_name: String },
}

/// Failure of a single recurrence. Counted, logged and recovered at the
/// recurrence boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecurrenceError {
    #[error(transparent)]
    Activity(#[from] ActivityExecutionError),

    #[error("Activity '{0}' is not defined in the plan")]
    UnknownActivity(String),

    #[error("Loop detected: activity '{0}' was already visited in this recurrence")]
    LoopDetected(String),

    #[error(transparent)]
    Evaluation(#[from] VariableEvaluationError),
}

/// A remote host rejected or could not receive an execute request
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Dispatch to host '{host}' failed: {message}")]
pub struct DispatchError {
    pub host: String,
    pub message: String,
}

impl DispatchError {
    pub fn new(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            message: message.into(),
        }
    }
}

/// A remote host could not report the state of a dispatched execution
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Polling host '{host}' failed: {message}")]
pub struct PollError {
    pub host: String,
    pub message: String,
}

impl PollError {
    pub fn new(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            message: message.into(),
        }
    }
}
