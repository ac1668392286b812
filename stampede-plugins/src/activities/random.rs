use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use stampede_core::{
    Activity, ActivityDescriptor, ActivityExecutionError, ExecutionContext, PlanError, Store,
};
use std::sync::Arc;

use super::{parse_config, required_variable};

pub const TYPE_TAG: &str = "random";

#[derive(Debug, Deserialize)]
struct RandomConfig {
    #[serde(default)]
    min: i64,
    max: i64,
    #[serde(default = "default_store")]
    store: Store,
}

fn default_store() -> Store {
    Store::Run
}

/// Stores a uniformly random integer in `[min, max]`
#[derive(Debug)]
pub struct RandomActivity {
    descriptor: ActivityDescriptor,
    variable: String,
    store: Store,
    min: i64,
    max: i64,
}

impl RandomActivity {
    pub fn create(descriptor: ActivityDescriptor, config: &JsonValue) -> Result<Arc<dyn Activity>, PlanError> {
        let variable = required_variable(&descriptor)?;
        let config: RandomConfig = parse_config(&descriptor, config)?;
        if config.min > config.max {
            return Err(PlanError::invalid_config(
                &descriptor.name,
                format!("min ({}) is greater than max ({})", config.min, config.max),
            ));
        }

        Ok(Arc::new(Self {
            descriptor,
            variable,
            store: config.store,
            min: config.min,
            max: config.max,
        }))
    }
}

#[async_trait]
impl Activity for RandomActivity {
    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn execute(&self, context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
        let value = rand::thread_rng().gen_range(self.min..=self.max);
        context.set_value(self.store, self.variable.clone(), value);
        Ok(())
    }
}
