//! HTTP transport configuration for reaching remote hosts

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_timeout"
    )]
    pub timeout: Duration,

    /// Connection timeout
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_connection_timeout"
    )]
    pub connection_timeout: Duration,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum idle connections kept per host
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connection_timeout: default_connection_timeout(),
            user_agent: default_user_agent(),
            max_idle_per_host: default_max_idle_per_host(),
        }
    }
}

impl Validatable for HttpConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.timeout.as_secs(), "timeout", self.domain_name())?;
        validate_positive(
            self.connection_timeout.as_secs(),
            "connection_timeout",
            self.domain_name(),
        )?;
        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        validate_positive(self.max_idle_per_host, "max_idle_per_host", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "http"
    }
}

// Default value functions
fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    format!("Stampede/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_idle_per_host() -> usize {
    10
}
