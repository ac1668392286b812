//! Core domain models and types for Stampede
//!
//! This crate contains the plan model shared by every other crate: the
//! activity contract, the immutable plan graph, the two-tier execution
//! context with its pattern evaluator, recurrence settings, result types
//! and the abstract dispatch/poll protocol spoken between the saturation
//! client and remote execution hosts.

pub mod activity;
pub mod context;
pub mod definition;
pub mod error;
pub mod plan;
pub mod protocol;
pub mod recurrence;
pub mod registry;
pub mod result;
pub mod value;

// Re-export commonly used types at the crate root
pub use activity::{Activity, ActivityDescriptor};
pub use context::{AccessPlan, Accessor, ExecutionContext, Store, NEXT_ACTIVITY_KEY};
pub use definition::{ActivityDefinition, PlanDefinition};
pub use error::{
    ActivityExecutionError, DispatchError, PlanError, PollError, RecurrenceError,
    VariableEvaluationError,
};
pub use plan::{ConfigOption, PlanGraph, PlanGraphBuilder, FINISH};
pub use protocol::{ExecuteRequest, PollResponse, RemoteEnvironment, ResultId};
pub use recurrence::{Recurrence, RecurrenceType};
pub use registry::{ActivityFactory, ActivityRegistry};
pub use result::{DurationStats, PlanEnvironmentResult, PlanExecutorResult};
pub use value::{ContextObject, ContextValue, Record};
