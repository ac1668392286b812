//! Activity implementations

pub mod branch;
pub mod delay;
pub mod fail;
pub mod log;
pub mod random;
pub mod set;

pub use branch::BranchActivity;
pub use delay::DelayActivity;
pub use fail::FailActivity;
pub use log::LogActivity;
pub use random::RandomActivity;
pub use set::SetActivity;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use stampede_core::{ActivityDescriptor, PlanError};

/// Deserialize an activity's `config` block. A missing block is read as an
/// empty mapping so that fields with defaults can be omitted entirely.
pub(crate) fn parse_config<T: DeserializeOwned>(
    descriptor: &ActivityDescriptor,
    config: &JsonValue,
) -> Result<T, PlanError> {
    let config = if config.is_null() {
        JsonValue::Object(Default::default())
    } else {
        config.clone()
    };
    serde_json::from_value(config)
        .map_err(|e| PlanError::invalid_config(&descriptor.name, e.to_string()))
}

/// The descriptor's `contextVariable`, which some activities require
pub(crate) fn required_variable(descriptor: &ActivityDescriptor) -> Result<String, PlanError> {
    descriptor
        .context_variable
        .clone()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| PlanError::invalid_config(&descriptor.name, "contextVariable is required"))
}
