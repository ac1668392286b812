use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use stampede_core::{
    Activity, ActivityDescriptor, ActivityExecutionError, ContextValue, ExecutionContext, PlanError,
    Store,
};
use std::sync::Arc;

use super::{parse_config, required_variable};

pub const TYPE_TAG: &str = "set";

#[derive(Debug, Deserialize)]
struct SetConfig {
    value: JsonValue,
    #[serde(default = "default_store")]
    store: Store,
}

fn default_store() -> Store {
    Store::Run
}

/// Writes a value into the context under `contextVariable`. String values
/// are interpolated first, so `${run.x}` patterns can be copied or combined.
#[derive(Debug)]
pub struct SetActivity {
    descriptor: ActivityDescriptor,
    variable: String,
    store: Store,
    value: JsonValue,
}

impl SetActivity {
    pub fn create(descriptor: ActivityDescriptor, config: &JsonValue) -> Result<Arc<dyn Activity>, PlanError> {
        let variable = required_variable(&descriptor)?;
        let config: SetConfig = parse_config(&descriptor, config)?;
        Ok(Arc::new(Self {
            descriptor,
            variable,
            store: config.store,
            value: config.value,
        }))
    }
}

#[async_trait]
impl Activity for SetActivity {
    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn execute(&self, context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
        let value = match &self.value {
            // A string that is exactly one pattern keeps the evaluated value's type
            JsonValue::String(text) if is_single_pattern(text) => context
                .evaluate(text)
                .map_err(|e| ActivityExecutionError::new(self.name(), e.to_string()))?
                .unwrap_or(ContextValue::Json(JsonValue::Null)),
            JsonValue::String(text) => context
                .interpolate(text)
                .map(ContextValue::from)
                .map_err(|e| ActivityExecutionError::new(self.name(), e.to_string()))?,
            other => ContextValue::Json(other.clone()),
        };

        context.set_value(self.store, self.variable.clone(), value);
        Ok(())
    }
}

fn is_single_pattern(text: &str) -> bool {
    text.starts_with("${") && text.ends_with('}') && text.matches("${").count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stampede_core::Record;

    fn set(variable: &str, config: JsonValue) -> Arc<dyn Activity> {
        SetActivity::create(
            ActivityDescriptor::new("set", TYPE_TAG).with_context_variable(variable),
            &config,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_set_literal_into_global() {
        let activity = set("limit", json!({"value": 10, "store": "global"}));
        let mut context = ExecutionContext::new();
        activity.execute(&mut context).await.unwrap();

        assert_eq!(context.get_value(Store::Global, "limit"), Some(&ContextValue::from(10i64)));
        assert!(context.get_value(Store::Run, "limit").is_none());
    }

    #[tokio::test]
    async fn test_set_copies_object_through_pattern() {
        let activity = set("city", json!({"value": "${global.addr.city}"}));
        let mut context = ExecutionContext::new();
        context.set_value(Store::Global, "addr", Record::new("Address").with_field("city", "Berlin"));

        activity.execute(&mut context).await.unwrap();
        assert_eq!(context.get_value(Store::Run, "city"), Some(&ContextValue::from("Berlin")));
    }

    #[tokio::test]
    async fn test_set_interpolates_template() {
        let activity = set("url", json!({"value": "/users/${run.id}/orders"}));
        let mut context = ExecutionContext::new();
        context.set_value(Store::Run, "id", 42i64);

        activity.execute(&mut context).await.unwrap();
        assert_eq!(
            context.get_value(Store::Run, "url"),
            Some(&ContextValue::from("/users/42/orders"))
        );
    }

    #[tokio::test]
    async fn test_absent_pattern_stays_absent_downstream() {
        let activity = set("customer", json!({"value": "${run.missing}"}));
        let mut context = ExecutionContext::new();
        activity.execute(&mut context).await.unwrap();

        assert_eq!(
            context.get_value(Store::Run, "customer"),
            Some(&ContextValue::Json(JsonValue::Null))
        );
        assert_eq!(context.evaluate("${run.customer.name}").unwrap(), None);
        assert_eq!(context.interpolate("hi ${run.customer}").unwrap(), "hi ");
    }

    #[test]
    fn test_set_requires_context_variable() {
        let err = SetActivity::create(ActivityDescriptor::new("set", TYPE_TAG), &json!({"value": 1})).unwrap_err();
        assert!(err.to_string().contains("contextVariable"));
    }
}
