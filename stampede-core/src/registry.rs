//! Type-tag to constructor mapping used to instantiate plan activities

use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::activity::{Activity, ActivityDescriptor};
use crate::error::PlanError;

/// Builds one activity instance from its descriptor and configuration.
///
/// This is the activity's `initialize` step: a factory rejects a bad
/// configuration with [`PlanError::InvalidActivityConfig`] so that the whole
/// plan build fails before anything executes.
pub trait ActivityFactory: Send + Sync {
    fn create(
        &self,
        descriptor: ActivityDescriptor,
        config: &JsonValue,
    ) -> Result<Arc<dyn Activity>, PlanError>;
}

impl<F> ActivityFactory for F
where
    F: Fn(ActivityDescriptor, &JsonValue) -> Result<Arc<dyn Activity>, PlanError> + Send + Sync,
{
    fn create(
        &self,
        descriptor: ActivityDescriptor,
        config: &JsonValue,
    ) -> Result<Arc<dyn Activity>, PlanError> {
        self(descriptor, config)
    }
}

/// Registry of activity factories keyed by `className`
#[derive(Clone, Default)]
pub struct ActivityRegistry {
    factories: HashMap<String, Arc<dyn ActivityFactory>>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one under the same tag
    pub fn register<F>(&mut self, type_tag: impl Into<String>, factory: F) -> &mut Self
    where
        F: ActivityFactory + 'static,
    {
        self.factories.insert(type_tag.into(), Arc::new(factory));
        self
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.factories.contains_key(type_tag)
    }

    pub fn type_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn create(
        &self,
        descriptor: ActivityDescriptor,
        config: &JsonValue,
    ) -> Result<Arc<dyn Activity>, PlanError> {
        let factory = self
            .factories
            .get(&descriptor.class_name)
            .ok_or_else(|| PlanError::UnknownActivityType {
                name: descriptor.name.clone(),
                class_name: descriptor.class_name.clone(),
            })?;
        factory.create(descriptor, config)
    }
}

impl fmt::Debug for ActivityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityRegistry")
            .field("type_tags", &self.type_tags())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;
    use crate::error::ActivityExecutionError;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Echo(ActivityDescriptor);

    #[async_trait]
    impl Activity for Echo {
        fn descriptor(&self) -> &ActivityDescriptor {
            &self.0
        }

        async fn execute(&self, _context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
            Ok(())
        }
    }

    fn echo_factory(descriptor: ActivityDescriptor, _config: &JsonValue) -> Result<Arc<dyn Activity>, PlanError> {
        Ok(Arc::new(Echo(descriptor)))
    }

    #[test]
    fn test_create_registered_type() {
        let mut registry = ActivityRegistry::new();
        registry.register("echo", echo_factory);

        let activity = registry
            .create(ActivityDescriptor::new("first", "echo"), &JsonValue::Null)
            .unwrap();
        assert_eq!(activity.name(), "first");
        assert_eq!(registry.type_tags(), vec!["echo"]);
    }

    #[test]
    fn test_unknown_type_tag() {
        let registry = ActivityRegistry::new();
        let err = registry
            .create(ActivityDescriptor::new("first", "soap"), &JsonValue::Null)
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::UnknownActivityType {
                name: "first".to_string(),
                class_name: "soap".to_string(),
            }
        );
    }

    #[test]
    fn test_factory_can_reject_config() {
        let mut registry = ActivityRegistry::new();
        registry.register("strict", |descriptor: ActivityDescriptor, config: &JsonValue| {
            if config.is_null() {
                Err(PlanError::invalid_config(descriptor.name, "config required"))
            } else {
                echo_factory(descriptor, config)
            }
        });

        assert!(registry
            .create(ActivityDescriptor::new("a", "strict"), &JsonValue::Null)
            .is_err());
        assert!(registry
            .create(ActivityDescriptor::new("a", "strict"), &serde_json::json!({}))
            .is_ok());
    }
}
