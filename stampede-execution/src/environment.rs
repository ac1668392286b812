//! Parallel pool of plan executors

use futures::FutureExt;
use stampede_config::ExecutionConfig;
use stampede_core::{PlanEnvironmentResult, PlanExecutorResult, PlanGraph, Recurrence};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ExecutionError;
use crate::executor::{InterruptFlag, PlanExecutor};

/// Runs `workers` independent executors of one plan and aggregates them.
///
/// Every executor gets its own context; the only shared state is the
/// immutable plan graph. At most `pool_size` executors run at the same time.
#[derive(Debug)]
pub struct ExecutionEnvironment {
    id: Uuid,
    plan: Arc<PlanGraph>,
    recurrence: Recurrence,
    workers: usize,
    pool_size: usize,
    interrupt: InterruptFlag,
}

impl ExecutionEnvironment {
    pub fn new(
        plan: Arc<PlanGraph>,
        recurrence: Recurrence,
        workers: usize,
    ) -> Result<Self, ExecutionError> {
        if workers == 0 {
            return Err(ExecutionError::InvalidWorkerCount(workers));
        }
        recurrence.require_count_based()?;

        Ok(Self {
            id: Uuid::new_v4(),
            plan,
            recurrence,
            workers,
            pool_size: workers,
            interrupt: InterruptFlag::new(),
        })
    }

    /// Bound the number of executors running at once
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.clamp(1, self.workers);
        if self.is_pool_limited() {
            warn!(
                environment = %self.id,
                workers = self.workers,
                pool_size = self.pool_size,
                "Worker pool is smaller than the requested thread count; executors will queue"
            );
        }
        self
    }

    pub fn with_config(self, config: &ExecutionConfig) -> Self {
        let pool_size = config.max_pool_size;
        self.with_pool_size(pool_size)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Whether fewer executors run at once than were requested
    pub fn is_pool_limited(&self) -> bool {
        self.pool_size < self.workers
    }

    /// Flag that stops every executor at its next recurrence boundary
    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    /// Run all executors and wait for every one of them.
    ///
    /// Recurrence failures only show up in the error count. A panicking
    /// executor or an interrupt aborts the whole run.
    pub async fn execute(&self) -> Result<PlanEnvironmentResult, ExecutionError> {
        info!(
            environment = %self.id,
            plan = self.plan.name(),
            workers = self.workers,
            pool_size = self.pool_size,
            "Starting execution environment"
        );

        let semaphore = Arc::new(Semaphore::new(self.pool_size));
        let mut tasks = JoinSet::new();

        for executor_id in 0..self.workers {
            let mut executor =
                PlanExecutor::new(executor_id, self.id, Arc::clone(&self.plan), self.recurrence)?
                    .with_interrupt(self.interrupt.clone());
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|_| {
                    ExecutionError::ExecutorFailed {
                        executor_id,
                        message: "worker pool closed".to_string(),
                    }
                })?;

                AssertUnwindSafe(executor.run())
                    .catch_unwind()
                    .await
                    .map_err(|panic| ExecutionError::ExecutorFailed {
                        executor_id,
                        message: panic_message(panic.as_ref()),
                    })
            });
        }

        let mut results: Vec<PlanExecutorResult> = Vec::with_capacity(self.workers);
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.unwrap_or(Err(ExecutionError::Interrupted));
            match outcome {
                Ok(result) => results.push(result),
                Err(failure) => {
                    error!(environment = %self.id, "Aborting environment: {}", failure);
                    tasks.abort_all();
                    return Err(failure);
                }
            }
        }

        if self.interrupt.is_interrupted() {
            info!(environment = %self.id, "Execution environment interrupted");
            return Err(ExecutionError::Interrupted);
        }

        results.sort_by_key(|result| result.executor_id);
        let aggregate = PlanEnvironmentResult::aggregate(self.id, self.plan.name(), &results);

        info!(
            environment = %self.id,
            recurrences = aggregate.recurrences_run,
            errors = aggregate.error_count,
            median_ms = aggregate.stats.median.as_secs_f64() * 1000.0,
            "Execution environment finished"
        );

        Ok(aggregate)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("executor panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("executor panicked: {}", message)
    } else {
        "executor panicked".to_string()
    }
}
