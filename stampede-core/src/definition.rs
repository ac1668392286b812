//! Serializable plan documents and their conversion into a [`PlanGraph`]

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::activity::ActivityDescriptor;
use crate::error::PlanError;
use crate::plan::{ConfigOption, PlanGraph};
use crate::registry::ActivityRegistry;

/// One activity entry of a plan document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    #[serde(flatten)]
    pub descriptor: ActivityDescriptor,
    /// Type-specific settings handed to the activity factory
    #[serde(default)]
    pub config: JsonValue,
}

/// A plan as it is written in YAML/JSON and sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub initial_activity: String,
    #[serde(default)]
    pub activities: Vec<ActivityDefinition>,
    #[serde(default)]
    pub config_options: Vec<ConfigOption>,
}

impl PlanDefinition {
    pub fn from_yaml(text: &str) -> Result<Self, PlanError> {
        serde_yaml::from_str(text).map_err(|e| PlanError::Parse(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self, PlanError> {
        serde_json::from_str(text).map_err(|e| PlanError::Parse(e.to_string()))
    }

    /// Instantiate every activity through `registry` and validate the graph
    pub fn build(&self, registry: &ActivityRegistry) -> Result<PlanGraph, PlanError> {
        let mut builder = PlanGraph::builder(&self.name)
            .description(&self.description)
            .initial_activity(&self.initial_activity);

        for definition in &self.activities {
            let mut descriptor = definition.descriptor.clone();
            if descriptor.id.is_empty() {
                descriptor.id = descriptor.name.clone();
            }
            debug!(
                "Creating activity '{}' of type '{}'",
                descriptor.name, descriptor.class_name
            );
            builder = builder.activity(registry.create(descriptor, &definition.config)?);
        }

        for option in &self.config_options {
            builder = builder.config_option(option.clone());
        }

        builder.build()
    }
}
