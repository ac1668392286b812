use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use stampede_core::{Activity, ActivityDescriptor, ActivityExecutionError, ExecutionContext, PlanError};
use std::sync::Arc;

use super::parse_config;

pub const TYPE_TAG: &str = "fail";

#[derive(Debug, Deserialize)]
struct FailConfig {
    #[serde(default = "default_message")]
    message: String,
}

fn default_message() -> String {
    "forced failure".to_string()
}

/// Always fails. Useful for checking error accounting in a plan.
#[derive(Debug)]
pub struct FailActivity {
    descriptor: ActivityDescriptor,
    message: String,
}

impl FailActivity {
    pub fn create(descriptor: ActivityDescriptor, config: &JsonValue) -> Result<Arc<dyn Activity>, PlanError> {
        let config: FailConfig = parse_config(&descriptor, config)?;
        Ok(Arc::new(Self {
            descriptor,
            message: config.message,
        }))
    }
}

#[async_trait]
impl Activity for FailActivity {
    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn execute(&self, context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
        let message = context
            .interpolate(&self.message)
            .unwrap_or_else(|_| self.message.clone());
        Err(ActivityExecutionError::new(self.name(), message))
    }
}
