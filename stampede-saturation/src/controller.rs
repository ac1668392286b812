//! Saturation ramp control loop

use futures::future::join_all;
use stampede_core::{ExecuteRequest, PlanDefinition, PollResponse, RemoteEnvironment, ResultId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::SaturationError;
use crate::round::{
    FailureStage, HostFailure, HostRoundResult, SaturationOutcome, SaturationReport,
    SaturationRound,
};
use crate::settings::SaturationSettings;

/// Cancels a running ramp. Rounds already dispatched are awaited but their
/// results are discarded.
#[derive(Debug, Clone)]
pub struct SaturationHandle {
    cancelled: Arc<watch::Sender<bool>>,
}

impl SaturationHandle {
    fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            cancelled: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    async fn wait_cancelled(&self) {
        let mut receiver = self.cancelled.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

/// Raises the thread count on every host until one of them saturates.
pub struct SaturationController {
    remote: Arc<dyn RemoteEnvironment>,
    plan: PlanDefinition,
    settings: SaturationSettings,
    wait: Duration,
    handle: SaturationHandle,
}

impl SaturationController {
    pub fn new(
        remote: Arc<dyn RemoteEnvironment>,
        plan: PlanDefinition,
        settings: SaturationSettings,
    ) -> Result<Self, SaturationError> {
        settings.validate()?;
        let wait = settings.estimated_wait()?;

        Ok(Self {
            remote,
            plan,
            settings,
            wait,
            handle: SaturationHandle::new(),
        })
    }

    pub fn handle(&self) -> SaturationHandle {
        self.handle.clone()
    }

    pub fn settings(&self) -> &SaturationSettings {
        &self.settings
    }

    /// Delay between dispatching a round and polling it
    pub fn round_wait(&self) -> Duration {
        self.wait
    }

    pub async fn run(&self) -> SaturationReport {
        let thread_counts = self.settings.thread_counts();
        info!(
            plan = %self.plan.name,
            hosts = self.settings.hosts.len(),
            rounds = thread_counts.len(),
            threshold_ms = self.settings.max_runtime_threshold.as_millis() as u64,
            "Starting saturation ramp"
        );

        let mut rounds: Vec<SaturationRound> = Vec::with_capacity(thread_counts.len());

        for thread_count in thread_counts {
            if self.handle.is_cancelled() {
                return self.finish(rounds, |completed| SaturationOutcome::Cancelled {
                    after_round: completed,
                });
            }

            let round = self.run_round(rounds.len() + 1, thread_count).await;

            if self.handle.is_cancelled() {
                info!(round = round.number, "Discarding round finished after cancellation");
                return self.finish(rounds, |completed| SaturationOutcome::Cancelled {
                    after_round: completed,
                });
            }

            let saturated = round.is_saturated();
            for host in round.saturated_hosts() {
                info!(
                    host = %host.host,
                    threads = thread_count,
                    median_ms = host.median().as_secs_f64() * 1000.0,
                    "Host reached the runtime threshold"
                );
            }
            rounds.push(round);

            if saturated {
                return self.finish(rounds, |_| SaturationOutcome::Saturated { thread_count });
            }
        }

        let max_threads = self.settings.max_threads;
        self.finish(rounds, |_| SaturationOutcome::NotSaturated { max_threads })
    }

    fn finish(
        &self,
        rounds: Vec<SaturationRound>,
        outcome: impl FnOnce(usize) -> SaturationOutcome,
    ) -> SaturationReport {
        let outcome = outcome(rounds.len());
        info!(plan = %self.plan.name, rounds = rounds.len(), "Saturation ramp finished: {}", outcome);
        SaturationReport {
            plan_name: self.plan.name.clone(),
            rounds,
            outcome,
        }
    }

    /// Dispatch to every host, wait, then poll every accepted host.
    ///
    /// Host failures are recorded in the round and never abort it.
    pub async fn run_round(&self, number: usize, thread_count: usize) -> SaturationRound {
        let request = ExecuteRequest {
            thread_count,
            recurrences: self.settings.recurrences,
            recurrence_type: self.settings.recurrence_type,
            plan: self.plan.clone(),
        };

        info!(round = number, threads = thread_count, "Dispatching saturation round");

        let dispatched = join_all(self.settings.hosts.iter().map(|host| {
            let request = &request;
            async move { (host.as_str(), self.remote.dispatch(host, request).await) }
        }))
        .await;

        let mut failures = Vec::new();
        let mut accepted: Vec<(&str, ResultId)> = Vec::with_capacity(dispatched.len());
        for (host, outcome) in dispatched {
            match outcome {
                Ok(result_id) => accepted.push((host, result_id)),
                Err(error) => {
                    warn!(round = number, host, "Dispatch failed: {}", error.message);
                    failures.push(HostFailure::new(host, FailureStage::Dispatch, error.message));
                }
            }
        }

        let mut hosts = Vec::with_capacity(accepted.len());
        if accepted.is_empty() {
            warn!(round = number, "No host accepted the round");
            return SaturationRound {
                number,
                thread_count,
                hosts,
                failures,
            };
        }

        tokio::select! {
            _ = tokio::time::sleep(self.wait) => {}
            _ = self.handle.wait_cancelled() => {
                info!(round = number, "Round wait interrupted by cancellation");
            }
        }

        let polled = join_all(accepted.into_iter().map(|(host, result_id)| async move {
            let outcome = self.remote.poll(host, &result_id).await;
            (host, result_id, outcome)
        }))
        .await;

        for (host, result_id, outcome) in polled {
            match outcome {
                Ok(PollResponse::Completed(result)) => hosts.push(HostRoundResult::from_environment(
                    host,
                    result_id,
                    &result,
                    self.settings.max_runtime_threshold,
                )),
                Ok(PollResponse::Pending) => {
                    warn!(round = number, host, result_id = %result_id, "Execution still pending after round wait");
                    failures.push(HostFailure::new(
                        host,
                        FailureStage::Pending,
                        format!("execution {} still running after {:?}", result_id, self.wait),
                    ));
                }
                Err(error) => {
                    warn!(round = number, host, "Poll failed: {}", error.message);
                    failures.push(HostFailure::new(host, FailureStage::Poll, error.message));
                }
            }
        }

        SaturationRound {
            number,
            thread_count,
            hosts,
            failures,
        }
    }
}
