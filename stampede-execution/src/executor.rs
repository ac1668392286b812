//! Single-task plan graph walker

use chrono::Utc;
use stampede_core::{
    DurationStats, ExecutionContext, PlanExecutorResult, PlanGraph, Recurrence, RecurrenceError,
    FINISH,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ExecutionError;

/// Lifecycle of a [`PlanExecutor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    Running { recurrence: u64 },
    Done,
}

/// Shared stop signal, observed between recurrences
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Walks one plan graph repeatedly on a single task.
///
/// Each executor owns its context, so the `global` store is private to the
/// executor and survives across its recurrences while the `run` store is
/// cleared before every recurrence. Failures inside a recurrence are counted
/// and logged, then the next recurrence starts.
#[derive(Debug)]
pub struct PlanExecutor {
    id: usize,
    environment_id: Uuid,
    plan: Arc<PlanGraph>,
    iterations: u64,
    context: ExecutionContext,
    state: ExecutorState,
    interrupt: InterruptFlag,
}

impl PlanExecutor {
    /// Fails for time-based recurrences, which the engine does not run
    pub fn new(
        id: usize,
        environment_id: Uuid,
        plan: Arc<PlanGraph>,
        recurrence: Recurrence,
    ) -> Result<Self, ExecutionError> {
        let iterations = recurrence.require_count_based()?;
        Ok(Self {
            id,
            environment_id,
            plan,
            iterations,
            context: ExecutionContext::new(),
            state: ExecutorState::Idle,
            interrupt: InterruptFlag::new(),
        })
    }

    /// Share an interrupt flag with the caller
    pub fn with_interrupt(mut self, interrupt: InterruptFlag) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    /// Run every recurrence and produce the executor result. An interrupt
    /// ends the loop early and the partial result is returned.
    pub async fn run(&mut self) -> PlanExecutorResult {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut durations = Vec::with_capacity(self.iterations.min(4096) as usize);
        let mut error_count = 0u64;
        let mut interrupted = false;

        debug!(
            executor = self.id,
            plan = self.plan.name(),
            "Starting {} recurrences",
            self.iterations
        );

        for recurrence in 0..self.iterations {
            if self.interrupt.is_interrupted() {
                info!(
                    executor = self.id,
                    "Interrupted after {} of {} recurrences", recurrence, self.iterations
                );
                interrupted = true;
                break;
            }

            self.state = ExecutorState::Running { recurrence };
            let begin = Instant::now();
            let outcome = self.run_recurrence().await;
            durations.push(begin.elapsed());

            if let Err(error) = outcome {
                error_count += 1;
                warn!(executor = self.id, recurrence, "Recurrence failed: {}", error);
            }
        }

        self.state = ExecutorState::Done;

        PlanExecutorResult {
            environment_id: self.environment_id,
            executor_id: self.id,
            plan_name: self.plan.name().to_string(),
            started_at,
            finished_at: Utc::now(),
            total_duration: clock.elapsed(),
            recurrences_run: durations.len() as u64,
            stats: DurationStats::from_samples(&durations),
            error_count,
            success: error_count == 0,
            interrupted,
            recurrence_durations: durations,
        }
    }

    /// One traversal from the initial activity to `finish`
    pub async fn run_recurrence(&mut self) -> Result<(), RecurrenceError> {
        self.context.clear_run_store();

        let plan = Arc::clone(&self.plan);
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = plan.initial_activity().to_string();

        while !current.is_empty() && current != FINISH {
            visited.insert(current.clone());

            let activity = plan
                .activity(&current)
                .ok_or_else(|| RecurrenceError::UnknownActivity(current.clone()))?;

            debug!(executor = self.id, activity = %current, "Executing activity");
            activity.execute(&mut self.context).await?;

            current = self
                .context
                .take_next_activity()
                .unwrap_or_else(|| activity.next_activity().to_string());

            if visited.contains(&current) {
                return Err(RecurrenceError::LoopDetected(current));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stampede_core::{
        Activity, ActivityDescriptor, ActivityExecutionError, ContextValue, RecurrenceType, Store,
    };

    /// Appends its name to `run.trail` and `global.trail`, optionally
    /// forcing the next activity
    #[derive(Debug)]
    struct Step {
        descriptor: ActivityDescriptor,
        force_next: Option<String>,
    }

    fn append(context: &mut ExecutionContext, store: Store, name: &str) {
        let trail = context
            .get_value(store, "trail")
            .map(ContextValue::render)
            .unwrap_or_default();
        context.set_value(store, "trail", format!("{}{}/", trail, name));
    }

    #[async_trait]
    impl Activity for Step {
        fn descriptor(&self) -> &ActivityDescriptor {
            &self.descriptor
        }

        async fn execute(&self, context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
            append(context, Store::Run, self.name());
            append(context, Store::Global, self.name());
            if let Some(ref next) = self.force_next {
                context.set_next_activity(next.clone());
            }
            Ok(())
        }
    }

    /// Fails on the recurrences listed in `global.fail_on`
    #[derive(Debug)]
    struct Flaky(ActivityDescriptor);

    #[async_trait]
    impl Activity for Flaky {
        fn descriptor(&self) -> &ActivityDescriptor {
            &self.0
        }

        async fn execute(&self, context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
            let count = context
                .get_value(Store::Global, "count")
                .and_then(ContextValue::as_i64)
                .unwrap_or(0);
            context.set_value(Store::Global, "count", count + 1);
            if count == 1 {
                return Err(ActivityExecutionError::new(self.name(), "boom"));
            }
            Ok(())
        }
    }

    /// Routes back to itself on the recurrence numbered `loop_on`, counted
    /// through `global.round`
    #[derive(Debug)]
    struct Gate {
        descriptor: ActivityDescriptor,
        loop_on: i64,
    }

    #[async_trait]
    impl Activity for Gate {
        fn descriptor(&self) -> &ActivityDescriptor {
            &self.descriptor
        }

        async fn execute(&self, context: &mut ExecutionContext) -> Result<(), ActivityExecutionError> {
            let round = context
                .get_value(Store::Global, "round")
                .and_then(ContextValue::as_i64)
                .unwrap_or(0);
            context.set_value(Store::Global, "round", round + 1);
            if round == self.loop_on {
                context.set_next_activity(self.name().to_string());
            }
            Ok(())
        }
    }

    fn gate(loop_on: i64) -> Arc<dyn Activity> {
        Arc::new(Gate {
            descriptor: ActivityDescriptor::new("gate", "gate").with_next("done"),
            loop_on,
        })
    }

    fn step(name: &str, next: &str) -> Arc<dyn Activity> {
        Arc::new(Step {
            descriptor: ActivityDescriptor::new(name, "step").with_next(next),
            force_next: None,
        })
    }

    fn graph(initial: &str, activities: Vec<Arc<dyn Activity>>) -> Arc<PlanGraph> {
        let builder = activities
            .into_iter()
            .fold(PlanGraph::builder("test").initial_activity(initial), |b, a| b.activity(a));
        Arc::new(builder.build().unwrap())
    }

    fn executor(plan: Arc<PlanGraph>, recurrences: u64) -> PlanExecutor {
        PlanExecutor::new(0, Uuid::nil(), plan, Recurrence::times(recurrences)).unwrap()
    }

    #[tokio::test]
    async fn test_linear_plan_runs_every_recurrence() {
        let plan = graph("a", vec![step("a", "b"), step("b", FINISH)]);
        let mut executor = executor(plan, 3);
        assert_eq!(executor.state(), ExecutorState::Idle);

        let result = executor.run().await;

        assert_eq!(executor.state(), ExecutorState::Done);
        assert_eq!(result.recurrences_run, 3);
        assert_eq!(result.error_count, 0);
        assert!(result.success);
        assert_eq!(result.recurrence_durations.len(), 3);
        assert!(result.stats.min <= result.stats.max);
        assert!(result.started_at <= result.finished_at);
    }

    #[tokio::test]
    async fn test_loop_detected_fails_single_recurrence() {
        let plan = graph("a", vec![step("a", "b"), step("b", "a")]);
        let mut executor = executor(plan, 1);

        let err = executor.run_recurrence().await.unwrap_err();
        assert_eq!(err, RecurrenceError::LoopDetected("a".to_string()));

        let result = executor.run().await;
        assert_eq!(result.error_count, 1);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_loop_in_one_recurrence_leaves_others_unaffected() {
        let plan = graph("gate", vec![gate(2), step("done", FINISH)]);
        let mut executor = executor(plan, 1);

        assert!(executor.run_recurrence().await.is_ok());
        assert!(executor.run_recurrence().await.is_ok());
        assert_eq!(
            executor.run_recurrence().await,
            Err(RecurrenceError::LoopDetected("gate".to_string()))
        );
        assert!(executor.run_recurrence().await.is_ok());
        assert_eq!(
            executor.context().get_value(Store::Run, "trail").map(ContextValue::render),
            Some("done/".to_string())
        );
    }

    #[tokio::test]
    async fn test_loop_counts_once_across_a_full_run() {
        let plan = graph("gate", vec![gate(2), step("done", FINISH)]);
        let mut executor = executor(plan, 5);

        let result = executor.run().await;
        assert_eq!(result.recurrences_run, 5);
        assert_eq!(result.error_count, 1);
        assert!(!result.success);
        assert_eq!(result.recurrence_durations.len(), 5);
        assert_eq!(
            executor.context().get_value(Store::Global, "trail").map(ContextValue::render),
            Some("done/".repeat(4))
        );
    }

    #[tokio::test]
    async fn test_self_loop_is_detected() {
        let plan = graph("a", vec![step("a", "a")]);
        let mut executor = executor(plan, 1);
        assert!(matches!(
            executor.run_recurrence().await,
            Err(RecurrenceError::LoopDetected(ref name)) if name == "a"
        ));
    }

    #[tokio::test]
    async fn test_unknown_successor_fails_recurrence() {
        let plan = graph("a", vec![step("a", "ghost")]);
        let mut executor = executor(plan, 2);

        let result = executor.run().await;
        assert_eq!(result.error_count, 2);
        assert_eq!(result.recurrences_run, 2);
    }

    #[tokio::test]
    async fn test_failed_recurrence_does_not_stop_others() {
        let flaky: Arc<dyn Activity> = Arc::new(Flaky(ActivityDescriptor::new("flaky", "flaky")));
        let plan = graph("flaky", vec![flaky]);
        let mut executor = executor(plan, 4);

        let result = executor.run().await;
        assert_eq!(result.recurrences_run, 4);
        assert_eq!(result.error_count, 1);
        assert_eq!(
            executor.context().get_value(Store::Global, "count"),
            Some(&ContextValue::from(4i64))
        );
    }

    #[tokio::test]
    async fn test_run_store_is_cleared_between_recurrences() {
        let plan = graph("a", vec![step("a", "b"), step("b", FINISH)]);
        let mut executor = executor(plan, 1);

        executor.run_recurrence().await.unwrap();
        executor
            .context_mut()
            .set_value(Store::Run, "leftover", 1i64);
        executor.run_recurrence().await.unwrap();

        let context = executor.context();
        assert!(context.get_value(Store::Run, "leftover").is_none());
        assert_eq!(
            context.get_value(Store::Run, "trail").map(ContextValue::render),
            Some("a/b/".to_string())
        );
        assert_eq!(
            context.get_value(Store::Global, "trail").map(ContextValue::render),
            Some("a/b/a/b/".to_string())
        );
    }

    #[tokio::test]
    async fn test_override_takes_precedence_and_is_consumed() {
        let router: Arc<dyn Activity> = Arc::new(Step {
            descriptor: ActivityDescriptor::new("router", "step").with_next("slow"),
            force_next: Some("fast".to_string()),
        });
        let plan = graph("router", vec![router, step("slow", FINISH), step("fast", FINISH)]);
        let mut executor = executor(plan, 1);

        executor.run_recurrence().await.unwrap();

        let context = executor.context();
        assert_eq!(
            context.get_value(Store::Run, "trail").map(ContextValue::render),
            Some("router/fast/".to_string())
        );
        assert!(!context.names(Store::Run).contains(stampede_core::NEXT_ACTIVITY_KEY));
    }

    #[tokio::test]
    async fn test_interrupt_returns_partial_result() {
        let plan = graph("a", vec![step("a", FINISH)]);
        let flag = InterruptFlag::new();
        let mut executor = executor(plan, 100).with_interrupt(flag.clone());

        flag.interrupt();
        let result = executor.run().await;

        assert!(result.interrupted);
        assert_eq!(result.recurrences_run, 0);
        assert_eq!(executor.state(), ExecutorState::Done);
    }

    #[test]
    fn test_time_based_recurrence_rejected() {
        let plan = graph("a", vec![step("a", FINISH)]);
        let err = PlanExecutor::new(0, Uuid::nil(), plan, Recurrence::new(5, RecurrenceType::Seconds))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Configuration(_)));
    }
}
