//! Immutable plan graph shared by all executors of a run

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

use crate::activity::Activity;
use crate::error::PlanError;

/// Reserved successor name that ends a recurrence
pub const FINISH: &str = "finish";

/// A named configuration blob attached to a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigOption {
    pub name: String,
    #[serde(default)]
    pub values: JsonValue,
}

/// Directed graph of activities keyed by name.
///
/// Edges are activity names rather than references, with [`FINISH`] as the
/// terminal sentinel, so the graph can be shared behind an `Arc` by any
/// number of concurrent executors.
#[derive(Debug, Clone)]
pub struct PlanGraph {
    name: String,
    description: String,
    initial_activity: String,
    activities: HashMap<String, Arc<dyn Activity>>,
    config_options: HashMap<String, ConfigOption>,
}

impl PlanGraph {
    pub fn builder(name: impl Into<String>) -> PlanGraphBuilder {
        PlanGraphBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn initial_activity(&self) -> &str {
        &self.initial_activity
    }

    pub fn activity(&self, name: &str) -> Option<&Arc<dyn Activity>> {
        self.activities.get(name)
    }

    pub fn activity_names(&self) -> impl Iterator<Item = &str> {
        self.activities.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn config_option(&self, name: &str) -> Option<&ConfigOption> {
        self.config_options.get(name)
    }

    pub fn config_options(&self) -> &HashMap<String, ConfigOption> {
        &self.config_options
    }
}

/// Collects activities and validates the graph invariants on `build`
#[derive(Debug)]
pub struct PlanGraphBuilder {
    name: String,
    description: String,
    initial_activity: Option<String>,
    activities: Vec<Arc<dyn Activity>>,
    config_options: Vec<ConfigOption>,
}

impl PlanGraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            initial_activity: None,
            activities: Vec::new(),
            config_options: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn initial_activity(mut self, name: impl Into<String>) -> Self {
        self.initial_activity = Some(name.into());
        self
    }

    pub fn activity(mut self, activity: Arc<dyn Activity>) -> Self {
        self.activities.push(activity);
        self
    }

    pub fn config_option(mut self, option: ConfigOption) -> Self {
        self.config_options.push(option);
        self
    }

    pub fn build(self) -> Result<PlanGraph, PlanError> {
        let initial_activity = self
            .initial_activity
            .filter(|name| !name.is_empty())
            .ok_or_else(|| PlanError::MissingInitialActivity(self.name.clone()))?;

        let mut activities = HashMap::with_capacity(self.activities.len());
        for activity in self.activities {
            let name = activity.name().to_string();
            if name == FINISH {
                return Err(PlanError::ReservedActivityName(name));
            }
            if activities.insert(name.clone(), activity).is_some() {
                return Err(PlanError::DuplicateActivity(name));
            }
        }

        if !activities.contains_key(&initial_activity) {
            return Err(PlanError::UnknownInitialActivity(initial_activity));
        }

        let config_options = self
            .config_options
            .into_iter()
            .map(|option| (option.name.clone(), option))
            .collect();

        Ok(PlanGraph {
            name: self.name,
            description: self.description,
            initial_activity,
            activities,
            config_options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityDescriptor;
    use crate::context::ExecutionContext;
    use crate::error::ActivityExecutionError;
    use async_trait::async_trait;

    #[derive(Debug)]
    struct Noop(ActivityDescriptor);

    #[async_trait]
    impl Activity for Noop {
        fn descriptor(&self) -> &ActivityDescriptor {
            &self.0
        }

        async fn execute(&self, _context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
            Ok(())
        }
    }

    fn noop(name: &str, next: &str) -> Arc<dyn Activity> {
        Arc::new(Noop(ActivityDescriptor::new(name, "noop").with_next(next)))
    }

    #[test]
    fn test_build_valid_graph() {
        let graph = PlanGraph::builder("checkout")
            .initial_activity("a")
            .activity(noop("a", "b"))
            .activity(noop("b", FINISH))
            .config_option(ConfigOption {
                name: "endpoint".to_string(),
                values: serde_json::json!({"url": "http://localhost"}),
            })
            .build()
            .unwrap();

        assert_eq!(graph.name(), "checkout");
        assert_eq!(graph.initial_activity(), "a");
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.activity("a").unwrap().next_activity(), "b");
        assert!(graph.config_option("endpoint").is_some());
    }

    #[test]
    fn test_initial_activity_must_resolve() {
        let err = PlanGraph::builder("p")
            .initial_activity("missing")
            .activity(noop("a", FINISH))
            .build()
            .unwrap_err();
        assert_eq!(err, PlanError::UnknownInitialActivity("missing".to_string()));

        let err = PlanGraph::builder("p").activity(noop("a", FINISH)).build().unwrap_err();
        assert_eq!(err, PlanError::MissingInitialActivity("p".to_string()));
    }

    #[test]
    fn test_finish_is_reserved() {
        let err = PlanGraph::builder("p")
            .initial_activity("a")
            .activity(noop("a", FINISH))
            .activity(noop(FINISH, FINISH))
            .build()
            .unwrap_err();
        assert_eq!(err, PlanError::ReservedActivityName(FINISH.to_string()));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = PlanGraph::builder("p")
            .initial_activity("a")
            .activity(noop("a", FINISH))
            .activity(noop("a", FINISH))
            .build()
            .unwrap_err();
        assert_eq!(err, PlanError::DuplicateActivity("a".to_string()));
    }
}
