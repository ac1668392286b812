//! Logging infrastructure for Stampede
//!
//! Everything logs through `tracing`. This crate installs the global
//! subscriber from a [`LoggingConfig`](stampede_config::LoggingConfig) and
//! provides [`ActivityLogHandle`], the explicit logging handle handed to
//! activities that write their own log lines.

pub mod handle;
pub mod init;

pub use handle::{ActivityLogHandle, ACTIVITY_LOG_TARGET};
pub use init::{build_env_filter, init_logging_from_config, init_simple_tracing, to_tracing_level};
