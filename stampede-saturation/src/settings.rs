//! Validated inputs of a saturation ramp

use stampede_config::SaturationConfig;
use stampede_core::RecurrenceType;
use std::time::Duration;

use crate::error::SaturationError;

const DEFAULT_PER_RECURRENCE_ESTIMATE: Duration = Duration::from_millis(500);
const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
pub struct SaturationSettings {
    pub hosts: Vec<String>,
    pub max_threads: usize,
    pub thread_increment: usize,
    pub recurrences: u64,
    pub recurrence_type: RecurrenceType,
    /// A host whose median recurrence reaches this value is saturated
    pub max_runtime_threshold: Duration,
    pub per_recurrence_estimate: Duration,
    pub safety_margin: Duration,
}

impl SaturationSettings {
    pub fn new(
        hosts: Vec<String>,
        max_threads: usize,
        thread_increment: usize,
        recurrences: u64,
        max_runtime_threshold: Duration,
    ) -> Self {
        Self {
            hosts,
            max_threads,
            thread_increment,
            recurrences,
            recurrence_type: RecurrenceType::Times,
            max_runtime_threshold,
            per_recurrence_estimate: DEFAULT_PER_RECURRENCE_ESTIMATE,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }

    pub fn from_config(config: &SaturationConfig) -> Result<Self, SaturationError> {
        let recurrence_type: RecurrenceType = config
            .recurrence_type
            .parse()
            .map_err(|e: stampede_core::PlanError| SaturationError::InvalidSettings(e.to_string()))?;

        let settings = Self {
            hosts: config.hosts.clone(),
            max_threads: config.max_threads,
            thread_increment: config.thread_increment,
            recurrences: config.recurrences,
            recurrence_type,
            max_runtime_threshold: config.max_runtime_threshold,
            per_recurrence_estimate: config.per_recurrence_estimate,
            safety_margin: config.safety_margin,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_recurrence_type(mut self, recurrence_type: RecurrenceType) -> Self {
        self.recurrence_type = recurrence_type;
        self
    }

    pub fn with_wait_estimate(mut self, per_recurrence: Duration, safety_margin: Duration) -> Self {
        self.per_recurrence_estimate = per_recurrence;
        self.safety_margin = safety_margin;
        self
    }

    pub fn validate(&self) -> Result<(), SaturationError> {
        if self.hosts.is_empty() {
            return Err(SaturationError::NoHosts);
        }
        if self.hosts.iter().any(|host| host.trim().is_empty()) {
            return Err(SaturationError::InvalidSettings("host names cannot be empty".to_string()));
        }
        if self.max_threads == 0 {
            return Err(SaturationError::InvalidSettings("max_threads must be greater than 0".to_string()));
        }
        if self.thread_increment == 0 {
            return Err(SaturationError::InvalidSettings(
                "thread_increment must be greater than 0".to_string(),
            ));
        }
        if self.recurrences == 0 {
            return Err(SaturationError::InvalidSettings("recurrences must be greater than 0".to_string()));
        }
        if !self.recurrence_type.is_count_based() {
            return Err(SaturationError::UnsupportedRecurrenceType(self.recurrence_type));
        }
        Ok(())
    }

    /// Increment clamped to `max_threads`
    pub fn effective_increment(&self) -> usize {
        self.thread_increment.min(self.max_threads)
    }

    /// Thread counts of every round: increment, 2 x increment, ... up to max_threads
    pub fn thread_counts(&self) -> Vec<usize> {
        let increment = self.effective_increment();
        if increment == 0 {
            return Vec::new();
        }
        (increment..=self.max_threads).step_by(increment).collect()
    }

    /// Time to wait between dispatching a round and polling it:
    /// `recurrences x per_recurrence_estimate + safety_margin`.
    pub fn estimated_wait(&self) -> Result<Duration, SaturationError> {
        match self.recurrence_type {
            RecurrenceType::Times => {
                let recurrences = u32::try_from(self.recurrences).unwrap_or(u32::MAX);
                Ok(self
                    .per_recurrence_estimate
                    .saturating_mul(recurrences)
                    .saturating_add(self.safety_margin))
            }
            other => Err(SaturationError::UnsupportedRecurrenceType(other)),
        }
    }
}
