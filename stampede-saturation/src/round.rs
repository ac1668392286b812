//! Per-round, per-host outcomes of a saturation ramp

use serde::Serialize;
use stampede_core::{DurationStats, PlanEnvironmentResult, ResultId};
use std::fmt;
use std::time::Duration;

/// Completed execution of one host in one round
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostRoundResult {
    pub host: String,
    pub result_id: ResultId,
    pub stats: DurationStats,
    pub recurrences_run: u64,
    pub error_count: u64,
    /// Median recurrence duration reached the threshold
    pub exceeds_threshold: bool,
}

impl HostRoundResult {
    pub fn from_environment(
        host: impl Into<String>,
        result_id: ResultId,
        result: &PlanEnvironmentResult,
        threshold: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            result_id,
            stats: result.stats,
            recurrences_run: result.recurrences_run,
            error_count: result.error_count,
            exceeds_threshold: result.stats.median >= threshold,
        }
    }

    pub fn median(&self) -> Duration {
        self.stats.median
    }
}

/// Step of the round at which a host dropped out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Dispatch,
    Poll,
    /// Still running when polled after the round wait
    Pending,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            FailureStage::Dispatch => "dispatch",
            FailureStage::Poll => "poll",
            FailureStage::Pending => "pending",
        };
        f.write_str(stage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostFailure {
    pub host: String,
    pub stage: FailureStage,
    pub message: String,
}

impl HostFailure {
    pub fn new(host: impl Into<String>, stage: FailureStage, message: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            stage,
            message: message.into(),
        }
    }
}

/// Everything collected for one thread count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaturationRound {
    /// 1-based round number
    pub number: usize,
    pub thread_count: usize,
    pub hosts: Vec<HostRoundResult>,
    pub failures: Vec<HostFailure>,
}

impl SaturationRound {
    pub fn is_saturated(&self) -> bool {
        self.hosts.iter().any(|host| host.exceeds_threshold)
    }

    pub fn saturated_hosts(&self) -> impl Iterator<Item = &HostRoundResult> {
        self.hosts.iter().filter(|host| host.exceeds_threshold)
    }

    pub fn highest_median(&self) -> Option<Duration> {
        self.hosts.iter().map(HostRoundResult::median).max()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaturationOutcome {
    Saturated { thread_count: usize },
    NotSaturated { max_threads: usize },
    /// Stopped by the caller; `after_round` rounds were completed
    Cancelled { after_round: usize },
}

impl fmt::Display for SaturationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaturationOutcome::Saturated { thread_count } => {
                write!(f, "saturation point found at {} threads", thread_count)
            }
            SaturationOutcome::NotSaturated { max_threads } => write!(
                f,
                "no saturation point found within configured bounds (max {} threads)",
                max_threads
            ),
            SaturationOutcome::Cancelled { after_round } => {
                write!(f, "cancelled after {} completed rounds", after_round)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaturationReport {
    pub plan_name: String,
    pub rounds: Vec<SaturationRound>,
    pub outcome: SaturationOutcome,
}

impl SaturationReport {
    pub fn saturation_point(&self) -> Option<usize> {
        match self.outcome {
            SaturationOutcome::Saturated { thread_count } => Some(thread_count),
            _ => None,
        }
    }

    /// Host failures of every round, in round order
    pub fn failures(&self) -> impl Iterator<Item = (usize, &HostFailure)> {
        self.rounds
            .iter()
            .flat_map(|round| round.failures.iter().map(move |failure| (round.number, failure)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn environment(median_ms: u64) -> PlanEnvironmentResult {
        let now = Utc::now();
        PlanEnvironmentResult {
            environment_id: Uuid::new_v4(),
            plan_name: "plan".to_string(),
            started_at: now,
            finished_at: now,
            executor_ids: [0usize].into_iter().collect(),
            recurrences_run: 4,
            stats: DurationStats {
                min: Duration::from_millis(1),
                max: Duration::from_millis(median_ms * 2),
                average: Duration::from_millis(median_ms),
                median: Duration::from_millis(median_ms),
            },
            error_count: 0,
            success: true,
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let threshold = Duration::from_millis(100);
        let at = HostRoundResult::from_environment("a", ResultId::new("1"), &environment(100), threshold);
        let below = HostRoundResult::from_environment("b", ResultId::new("2"), &environment(99), threshold);
        assert!(at.exceeds_threshold);
        assert!(!below.exceeds_threshold);
    }

    #[test]
    fn test_round_saturated_when_any_host_exceeds() {
        let threshold = Duration::from_millis(100);
        let round = SaturationRound {
            number: 1,
            thread_count: 4,
            hosts: vec![
                HostRoundResult::from_environment("a", ResultId::new("1"), &environment(50), threshold),
                HostRoundResult::from_environment("b", ResultId::new("2"), &environment(120), threshold),
            ],
            failures: vec![],
        };

        assert!(round.is_saturated());
        assert_eq!(round.saturated_hosts().map(|h| h.host.as_str()).collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(round.highest_median(), Some(Duration::from_millis(120)));
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(SaturationOutcome::Saturated { thread_count: 8 }).unwrap();
        assert_eq!(json, serde_json::json!({"status": "saturated", "thread_count": 8}));
    }
}
