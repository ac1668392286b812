use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use stampede_core::{
    AccessPlan, Activity, ActivityDescriptor, ActivityExecutionError, ContextValue,
    ExecutionContext, PlanError,
};
use std::sync::Arc;

use super::parse_config;

pub const TYPE_TAG: &str = "branch";

#[derive(Debug, Deserialize)]
struct BranchConfig {
    variable: String,
    equals: JsonValue,
    then: String,
    #[serde(rename = "else", default)]
    otherwise: Option<String>,
}

/// Chooses the next activity by comparing a context variable with a value.
///
/// On a match the next activity is `then`; otherwise it is `else` when
/// given, or the static `nextActivity`.
#[derive(Debug)]
pub struct BranchActivity {
    descriptor: ActivityDescriptor,
    variable: String,
    equals: JsonValue,
    then: String,
    otherwise: Option<String>,
}

impl BranchActivity {
    pub fn create(descriptor: ActivityDescriptor, config: &JsonValue) -> Result<Arc<dyn Activity>, PlanError> {
        let config: BranchConfig = parse_config(&descriptor, config)?;
        AccessPlan::parse(&config.variable)
            .map_err(|e| PlanError::invalid_config(&descriptor.name, e.to_string()))?;

        Ok(Arc::new(Self {
            descriptor,
            variable: config.variable,
            equals: config.equals,
            then: config.then,
            otherwise: config.otherwise,
        }))
    }

    fn matches(&self, value: Option<&ContextValue>) -> bool {
        match (value, &self.equals) {
            (None, JsonValue::Null) => true,
            (None, _) => false,
            (Some(value), JsonValue::String(expected)) => value.render() == *expected,
            (Some(value), expected) => value.as_json() == *expected,
        }
    }
}

#[async_trait]
impl Activity for BranchActivity {
    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn execute(&self, context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
        let value = context
            .evaluate(&self.variable)
            .map_err(|e| ActivityExecutionError::new(self.name(), e.to_string()))?;

        if self.matches(value.as_ref()) {
            context.set_next_activity(self.then.clone());
        } else if let Some(ref otherwise) = self.otherwise {
            context.set_next_activity(otherwise.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stampede_core::Store;

    fn branch(config: JsonValue) -> Arc<dyn Activity> {
        BranchActivity::create(
            ActivityDescriptor::new("route", TYPE_TAG).with_next("default"),
            &config,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_branch_takes_then_on_match() {
        let activity = branch(json!({"variable": "${run.role}", "equals": "admin", "then": "audit", "else": "browse"}));
        let mut context = ExecutionContext::new();

        context.set_value(Store::Run, "role", "admin");
        activity.execute(&mut context).await.unwrap();
        assert_eq!(context.take_next_activity(), Some("audit".to_string()));

        context.set_value(Store::Run, "role", "guest");
        activity.execute(&mut context).await.unwrap();
        assert_eq!(context.take_next_activity(), Some("browse".to_string()));
    }

    #[tokio::test]
    async fn test_branch_without_else_keeps_static_successor() {
        let activity = branch(json!({"variable": "${global.count}", "equals": 3, "then": "stop"}));
        let mut context = ExecutionContext::new();
        context.set_value(Store::Global, "count", 2i64);

        activity.execute(&mut context).await.unwrap();
        assert_eq!(context.take_next_activity(), None);
        assert_eq!(activity.next_activity(), "default");
    }

    #[tokio::test]
    async fn test_branch_on_absent_value() {
        let activity = branch(json!({"variable": "${run.token}", "equals": null, "then": "login"}));
        let mut context = ExecutionContext::new();

        activity.execute(&mut context).await.unwrap();
        assert_eq!(context.take_next_activity(), Some("login".to_string()));
    }

    #[test]
    fn test_branch_rejects_bad_pattern() {
        let result = BranchActivity::create(
            ActivityDescriptor::new("route", TYPE_TAG),
            &json!({"variable": "role", "equals": 1, "then": "x"}),
        );
        assert!(matches!(result, Err(PlanError::InvalidActivityConfig { .. })));
    }
}
