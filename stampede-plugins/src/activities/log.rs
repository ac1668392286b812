use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use stampede_core::{Activity, ActivityDescriptor, ActivityExecutionError, ExecutionContext, PlanError};
use stampede_logging::ActivityLogHandle;
use std::sync::Arc;
use tracing::Level;

use super::parse_config;

pub const TYPE_TAG: &str = "log";

#[derive(Debug, Deserialize)]
struct LogConfig {
    message: String,
    #[serde(default = "default_level")]
    level: String,
    /// Label attached to every line, defaults to the activity name
    #[serde(default)]
    label: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

/// Writes an interpolated message through the activity's own log handle
#[derive(Debug)]
pub struct LogActivity {
    descriptor: ActivityDescriptor,
    message: String,
    handle: ActivityLogHandle,
}

impl LogActivity {
    pub fn create(descriptor: ActivityDescriptor, config: &JsonValue) -> Result<Arc<dyn Activity>, PlanError> {
        Ok(Arc::new(Self::build(descriptor, config)?))
    }

    fn build(descriptor: ActivityDescriptor, config: &JsonValue) -> Result<Self, PlanError> {
        let config: LogConfig = parse_config(&descriptor, config)?;
        let level: Level = config.level.parse().map_err(|_| {
            PlanError::invalid_config(&descriptor.name, format!("unknown log level '{}'", config.level))
        })?;
        let label = config.label.unwrap_or_else(|| descriptor.name.clone());
        let handle = ActivityLogHandle::new(&descriptor.name, label, level);

        Ok(Self {
            descriptor,
            message: config.message,
            handle,
        })
    }

    pub fn handle(&self) -> &ActivityLogHandle {
        &self.handle
    }
}

#[async_trait]
impl Activity for LogActivity {
    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn execute(&self, context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
        let message = context
            .interpolate(&self.message)
            .map_err(|e| ActivityExecutionError::new(self.name(), e.to_string()))?;
        self.handle.emit(&message);
        Ok(())
    }
}
