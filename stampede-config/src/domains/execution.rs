//! Plan execution configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};

/// Local plan execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Worker count used when a run does not specify one
    #[serde(default = "default_workers")]
    pub default_workers: usize,

    /// Upper bound on concurrently running executors in one environment
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,

    /// Recurrence count used when a run does not specify one
    #[serde(default = "default_recurrences")]
    pub default_recurrences: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_workers: default_workers(),
            max_pool_size: default_max_pool_size(),
            default_recurrences: default_recurrences(),
        }
    }
}

impl Validatable for ExecutionConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.default_workers, "default_workers", self.domain_name())?;
        validate_positive(self.max_pool_size, "max_pool_size", self.domain_name())?;
        validate_positive(self.default_recurrences, "default_recurrences", self.domain_name())?;

        if self.default_workers > self.max_pool_size {
            return Err(self.validation_error(format!(
                "default_workers ({}) cannot exceed max_pool_size ({})",
                self.default_workers, self.max_pool_size
            )));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "execution"
    }
}

// Default value functions
fn default_workers() -> usize {
    1
}

fn default_max_pool_size() -> usize {
    (num_cpus::get() * 4).max(256)
}

fn default_recurrences() -> u64 {
    1
}
