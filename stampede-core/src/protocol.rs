//! Abstract dispatch/poll protocol between a saturation client and the
//! hosts running execution environments

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::definition::PlanDefinition;
use crate::error::{DispatchError, PollError};
use crate::recurrence::{Recurrence, RecurrenceType};
use crate::result::PlanEnvironmentResult;

/// Request to run a plan with a given concurrency on one host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub thread_count: usize,
    pub recurrences: u64,
    #[serde(default)]
    pub recurrence_type: RecurrenceType,
    pub plan: PlanDefinition,
}

impl ExecuteRequest {
    pub fn recurrence(&self) -> Recurrence {
        Recurrence::new(self.recurrences, self.recurrence_type)
    }
}

/// Handle returned by a host for a dispatched execution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(pub String);

impl ResultId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for ResultId {
    fn from(id: Uuid) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of a dispatched execution
#[derive(Debug, Clone, PartialEq)]
pub enum PollResponse {
    Pending,
    Completed(PlanEnvironmentResult),
}

impl PollResponse {
    pub fn is_pending(&self) -> bool {
        matches!(self, PollResponse::Pending)
    }
}

/// Transport used to reach remote execution environments
#[async_trait]
pub trait RemoteEnvironment: Send + Sync {
    async fn dispatch(&self, host: &str, request: &ExecuteRequest) -> Result<ResultId, DispatchError>;

    async fn poll(&self, host: &str, result_id: &ResultId) -> Result<PollResponse, PollError>;
}
