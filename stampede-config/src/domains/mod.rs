//! Domain-specific configuration modules

pub mod execution;
pub mod http;
pub mod logging;
pub mod saturation;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Stampede configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StampedeConfig {
    /// Local plan execution configuration
    #[serde(default)]
    pub execution: execution::ExecutionConfig,

    /// Saturation ramp configuration
    #[serde(default)]
    pub saturation: saturation::SaturationConfig,

    /// HTTP transport configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl StampedeConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.execution.validate()?;
        self.saturation.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = StampedeConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
