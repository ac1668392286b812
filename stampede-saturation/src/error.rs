use stampede_core::RecurrenceType;
use thiserror::Error;

/// Errors raised before a saturation ramp starts
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaturationError {
    #[error("Invalid saturation settings: {0}")]
    InvalidSettings(String),

    #[error("Recurrence type '{0}' has no round duration estimate; only 'times' is supported")]
    UnsupportedRecurrenceType(RecurrenceType),

    #[error("No hosts configured for the saturation run")]
    NoHosts,
}
