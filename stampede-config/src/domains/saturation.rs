//! Saturation ramp configuration

use crate::error::ConfigResult;
use crate::validation::{validate_enum_choice, validate_host, validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Recurrence types the saturation ramp can estimate a wait for
pub const SUPPORTED_RECURRENCE_TYPES: &[&str] = &["times"];

/// Recurrence types a plan may name at all
pub const KNOWN_RECURRENCE_TYPES: &[&str] = &["times", "millis", "seconds", "minutes", "hours"];

/// Client-side saturation search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationConfig {
    /// Remote hosts running execution environments
    #[serde(default)]
    pub hosts: Vec<String>,

    /// Highest thread count the ramp will try
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    /// Thread count added per round
    #[serde(default = "default_thread_increment")]
    pub thread_increment: usize,

    /// Recurrences each executor runs per round
    #[serde(default = "default_recurrences")]
    pub recurrences: u64,

    #[serde(default = "default_recurrence_type")]
    pub recurrence_type: String,

    /// Median single-recurrence duration at which a host is saturated
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_max_runtime_threshold",
        rename = "max_runtime_threshold_ms"
    )]
    pub max_runtime_threshold: Duration,

    /// Estimated duration of one recurrence used to size the round wait
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_per_recurrence_estimate",
        rename = "per_recurrence_estimate_ms"
    )]
    pub per_recurrence_estimate: Duration,

    /// Fixed delay added on top of the estimated round duration
    #[serde(
        with = "crate::domains::utils::serde_duration_ms",
        default = "default_safety_margin",
        rename = "safety_margin_ms"
    )]
    pub safety_margin: Duration,

    /// Re-poll hosts that are still running after the wait
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_retry: Option<PollRetryConfig>,
}

/// Retry settings for polls that come back pending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollRetryConfig {
    #[serde(default = "default_poll_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_poll_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_poll_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_poll_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for SaturationConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            max_threads: default_max_threads(),
            thread_increment: default_thread_increment(),
            recurrences: default_recurrences(),
            recurrence_type: default_recurrence_type(),
            max_runtime_threshold: default_max_runtime_threshold(),
            per_recurrence_estimate: default_per_recurrence_estimate(),
            safety_margin: default_safety_margin(),
            poll_retry: None,
        }
    }
}

impl Default for PollRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_poll_max_attempts(),
            initial_delay_ms: default_poll_initial_delay_ms(),
            max_delay_ms: default_poll_max_delay_ms(),
            backoff_multiplier: default_poll_backoff_multiplier(),
        }
    }
}

impl Validatable for SaturationConfig {
    fn validate(&self) -> ConfigResult<()> {
        for host in &self.hosts {
            validate_host(host, "hosts", self.domain_name())?;
        }

        validate_positive(self.max_threads, "max_threads", self.domain_name())?;
        validate_positive(self.thread_increment, "thread_increment", self.domain_name())?;
        validate_positive(self.recurrences, "recurrences", self.domain_name())?;
        validate_enum_choice(
            &self.recurrence_type,
            KNOWN_RECURRENCE_TYPES,
            "recurrence_type",
            self.domain_name(),
        )?;
        validate_positive(
            self.max_runtime_threshold.as_millis(),
            "max_runtime_threshold_ms",
            self.domain_name(),
        )?;

        if let Some(ref retry) = self.poll_retry {
            retry.validate()?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "saturation"
    }
}

impl Validatable for PollRetryConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_attempts, "max_attempts", self.domain_name())?;

        if self.max_delay_ms < self.initial_delay_ms {
            return Err(self.validation_error("max_delay_ms must be >= initial_delay_ms"));
        }

        if self.backoff_multiplier < 1.0 {
            return Err(self.validation_error("backoff_multiplier must be >= 1.0"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "saturation.poll_retry"
    }
}

// Default value functions
fn default_max_threads() -> usize {
    64
}

fn default_thread_increment() -> usize {
    8
}

fn default_recurrences() -> u64 {
    10
}

fn default_recurrence_type() -> String {
    "times".to_string()
}

fn default_max_runtime_threshold() -> Duration {
    Duration::from_millis(1000)
}

fn default_per_recurrence_estimate() -> Duration {
    Duration::from_millis(500)
}

fn default_safety_margin() -> Duration {
    Duration::from_secs(5)
}

fn default_poll_max_attempts() -> u32 {
    5
}

fn default_poll_initial_delay_ms() -> u64 {
    1000
}

fn default_poll_max_delay_ms() -> u64 {
    10_000
}

fn default_poll_backoff_multiplier() -> f64 {
    2.0
}
