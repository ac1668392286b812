//! Domain-driven configuration management for Stampede
//!
//! Configuration is split by functional domain (execution, saturation,
//! http, logging). Each domain carries its own defaults and validation and
//! can be overridden through `STAMPEDE_*` environment variables.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    execution::ExecutionConfig,
    http::HttpConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    saturation::{PollRetryConfig, SaturationConfig},
    StampedeConfig,
};

// Re-export utilities
pub use domains::utils::{serde_duration, serde_duration_ms};
