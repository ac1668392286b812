//! Adaptive concurrency ramp across remote execution hosts
//!
//! The [`SaturationController`] dispatches the same plan to every host with
//! a growing thread count, waits an estimated round duration, polls each
//! host and stops at the first round where any host's median recurrence
//! duration reaches the configured threshold.

pub mod controller;
pub mod error;
pub mod retry;
pub mod round;
pub mod settings;

pub use controller::{SaturationController, SaturationHandle};
pub use error::SaturationError;
pub use retry::{poll_retry_policy, RetryingRemote};
pub use round::{
    FailureStage, HostFailure, HostRoundResult, SaturationOutcome, SaturationReport,
    SaturationRound,
};
pub use settings::SaturationSettings;
