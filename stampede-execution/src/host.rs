//! In-process host speaking the dispatch/poll protocol

use async_trait::async_trait;
use stampede_config::ExecutionConfig;
use stampede_core::{
    ActivityRegistry, DispatchError, ExecuteRequest, PlanEnvironmentResult, PollError,
    PollResponse, RemoteEnvironment, ResultId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::environment::ExecutionEnvironment;

#[derive(Debug, Clone)]
enum ExecutionSlot {
    Running,
    Completed(PlanEnvironmentResult),
    Failed(String),
}

/// Runs dispatched plans on the local tokio runtime.
///
/// The host name passed to `dispatch`/`poll` is only used for logging and
/// errors; every request lands on this process.
#[derive(Debug, Clone)]
pub struct LocalHost {
    registry: Arc<ActivityRegistry>,
    config: ExecutionConfig,
    executions: Arc<RwLock<HashMap<ResultId, ExecutionSlot>>>,
}

impl LocalHost {
    pub fn new(registry: ActivityRegistry) -> Self {
        Self::with_config(registry, ExecutionConfig::default())
    }

    pub fn with_config(registry: ActivityRegistry, config: ExecutionConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
            executions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of executions whose result has not been collected yet
    pub async fn tracked(&self) -> usize {
        self.executions.read().await.len()
    }

    /// Number of executions that have not finished yet
    pub async fn running(&self) -> usize {
        self.executions
            .read()
            .await
            .values()
            .filter(|slot| matches!(slot, ExecutionSlot::Running))
            .count()
    }
}

#[async_trait]
impl RemoteEnvironment for LocalHost {
    async fn dispatch(&self, host: &str, request: &ExecuteRequest) -> Result<ResultId, DispatchError> {
        let plan = request
            .plan
            .build(&self.registry)
            .map_err(|e| DispatchError::new(host, e.to_string()))?;

        let environment =
            ExecutionEnvironment::new(Arc::new(plan), request.recurrence(), request.thread_count)
                .map_err(|e| DispatchError::new(host, e.to_string()))?
                .with_config(&self.config);

        let result_id = ResultId::from(environment.id());
        self.executions
            .write()
            .await
            .insert(result_id.clone(), ExecutionSlot::Running);

        info!(
            host,
            result_id = %result_id,
            threads = request.thread_count,
            recurrences = request.recurrences,
            "Dispatched plan '{}'",
            request.plan.name
        );

        let executions = Arc::clone(&self.executions);
        let slot_id = result_id.clone();
        tokio::spawn(async move {
            let slot = match environment.execute().await {
                Ok(result) => ExecutionSlot::Completed(result),
                Err(error) => {
                    warn!(result_id = %slot_id, "Local execution failed: {}", error);
                    ExecutionSlot::Failed(error.to_string())
                }
            };
            executions.write().await.insert(slot_id, slot);
        });

        Ok(result_id)
    }

    /// Finished results are handed out once and then forgotten
    async fn poll(&self, host: &str, result_id: &ResultId) -> Result<PollResponse, PollError> {
        let mut executions = self.executions.write().await;
        let unknown = || PollError::new(host, format!("unknown result id {}", result_id));

        debug!(host, result_id = %result_id, "Polled local execution");
        if matches!(executions.get(result_id), Some(ExecutionSlot::Running)) {
            return Ok(PollResponse::Pending);
        }

        match executions.remove(result_id).ok_or_else(unknown)? {
            ExecutionSlot::Running => Ok(PollResponse::Pending),
            ExecutionSlot::Completed(result) => Ok(PollResponse::Completed(result)),
            ExecutionSlot::Failed(message) => Err(PollError::new(host, message)),
        }
    }
}
