use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use stampede_core::{Activity, ActivityDescriptor, ActivityExecutionError, ExecutionContext, PlanError};
use std::sync::Arc;
use std::time::Duration;

use super::parse_config;

pub const TYPE_TAG: &str = "delay";

#[derive(Debug, Deserialize)]
struct DelayConfig {
    millis: u64,
}

/// Sleeps for a fixed time, standing in for think time or a slow call
#[derive(Debug)]
pub struct DelayActivity {
    descriptor: ActivityDescriptor,
    delay: Duration,
}

impl DelayActivity {
    pub fn new(descriptor: ActivityDescriptor, delay: Duration) -> Self {
        Self { descriptor, delay }
    }

    pub fn create(descriptor: ActivityDescriptor, config: &JsonValue) -> Result<Arc<dyn Activity>, PlanError> {
        let config: DelayConfig = parse_config(&descriptor, config)?;
        Ok(Arc::new(Self::new(descriptor, Duration::from_millis(config.millis))))
    }
}

#[async_trait]
impl Activity for DelayActivity {
    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn execute(&self, _context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
