use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PlanError;

/// How the recurrence count of an execution is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceType {
    /// Run the plan a fixed number of times
    #[default]
    Times,
    Millis,
    Seconds,
    Minutes,
    Hours,
}

impl RecurrenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceType::Times => "times",
            RecurrenceType::Millis => "millis",
            RecurrenceType::Seconds => "seconds",
            RecurrenceType::Minutes => "minutes",
            RecurrenceType::Hours => "hours",
        }
    }

    pub fn is_count_based(&self) -> bool {
        matches!(self, RecurrenceType::Times)
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceType {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "times" => Ok(RecurrenceType::Times),
            "millis" => Ok(RecurrenceType::Millis),
            "seconds" => Ok(RecurrenceType::Seconds),
            "minutes" => Ok(RecurrenceType::Minutes),
            "hours" => Ok(RecurrenceType::Hours),
            other => Err(PlanError::UnsupportedRecurrenceType(other.to_string())),
        }
    }
}

/// Count and unit of plan repetitions for one executor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub count: u64,
    #[serde(rename = "type", default)]
    pub kind: RecurrenceType,
}

impl Recurrence {
    pub fn new(count: u64, kind: RecurrenceType) -> Self {
        Self { count, kind }
    }

    pub fn times(count: u64) -> Self {
        Self::new(count, RecurrenceType::Times)
    }

    /// Number of iterations, or an error for time-based recurrences which
    /// the engine does not execute
    pub fn require_count_based(&self) -> Result<u64, PlanError> {
        if self.kind.is_count_based() {
            Ok(self.count)
        } else {
            Err(PlanError::UnsupportedRecurrenceType(self.kind.to_string()))
        }
    }
}
