//! The capability contract every plan node implements

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::context::ExecutionContext;
use crate::error::ActivityExecutionError;
use crate::plan::FINISH;

/// Identity and graph edge of an activity, shared by every activity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityDescriptor {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// Type tag resolved through the activity registry
    pub class_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_next_activity")]
    pub next_activity: String,
    /// Name under which the activity writes its result, if it has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_variable: Option<String>,
}

fn default_next_activity() -> String {
    FINISH.to_string()
}

impl ActivityDescriptor {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
            class_name: class_name.into(),
            description: String::new(),
            next_activity: default_next_activity(),
            context_variable: None,
        }
    }

    pub fn with_next(mut self, next_activity: impl Into<String>) -> Self {
        self.next_activity = next_activity.into();
        self
    }

    pub fn with_context_variable(mut self, variable: impl Into<String>) -> Self {
        self.context_variable = Some(variable.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A named unit of work forming one node of a plan graph.
///
/// Activities are shared read-only between all executors running the same
/// plan, so any per-call state belongs in the [`ExecutionContext`]. An
/// activity may force its successor by calling
/// [`ExecutionContext::set_next_activity`]; otherwise the executor follows
/// [`Activity::next_activity`].
#[async_trait]
pub trait Activity: Send + Sync + fmt::Debug {
    fn descriptor(&self) -> &ActivityDescriptor;

    fn name(&self) -> &str {
        &self.descriptor().name
    }

    fn next_activity(&self) -> &str {
        &self.descriptor().next_activity
    }

    async fn execute(&self, context: &mut ExecutionContext) -> Result<(), ActivityExecutionError>;
}
