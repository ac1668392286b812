//! Stampede execution engine
//!
//! [`PlanExecutor`] walks a plan graph for a number of recurrences on a
//! single task. [`ExecutionEnvironment`] runs many executors of the same
//! plan in parallel and aggregates their results. [`LocalHost`] exposes an
//! environment through the dispatch/poll protocol without any transport.

pub mod environment;
pub mod error;
pub mod executor;
pub mod host;

// Re-export main types
pub use environment::ExecutionEnvironment;
pub use error::ExecutionError;
pub use executor::{ExecutorState, InterruptFlag, PlanExecutor};
pub use host::LocalHost;
