//! Executor and environment results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

/// Serialize a `Duration` as fractional milliseconds
pub mod duration_ms {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = f64::deserialize(deserializer)?;
        if !millis.is_finite() || millis < 0.0 {
            return Err(de::Error::custom(format!("invalid duration: {} ms", millis)));
        }
        Ok(Duration::from_nanos((millis * 1_000_000.0).round() as u64))
    }
}

/// Min/max/average/median of single-recurrence durations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationStats {
    #[serde(rename = "min_ms", with = "duration_ms")]
    pub min: Duration,
    #[serde(rename = "max_ms", with = "duration_ms")]
    pub max: Duration,
    #[serde(rename = "average_ms", with = "duration_ms")]
    pub average: Duration,
    #[serde(rename = "median_ms", with = "duration_ms")]
    pub median: Duration,
}

impl DurationStats {
    /// Statistics over raw samples; all zero when there are none
    pub fn from_samples(samples: &[Duration]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_unstable();

        let total: Duration = sorted.iter().sum();
        Self {
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            average: total / sorted.len() as u32,
            median: median_of_sorted(&sorted),
        }
    }
}

fn median_of_sorted(sorted: &[Duration]) -> Duration {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2
    } else {
        sorted[mid]
    }
}

/// Outcome of one executor's run, produced once when its loop ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanExecutorResult {
    pub environment_id: Uuid,
    pub executor_id: usize,
    pub plan_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(rename = "total_duration_ms", with = "duration_ms")]
    pub total_duration: Duration,
    pub recurrences_run: u64,
    pub stats: DurationStats,
    pub error_count: u64,
    pub success: bool,
    /// Set when the loop stopped early on an interrupt
    #[serde(default)]
    pub interrupted: bool,
    #[serde(skip)]
    pub recurrence_durations: Vec<Duration>,
}

/// Aggregate over every executor of one environment run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEnvironmentResult {
    pub environment_id: Uuid,
    pub plan_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub executor_ids: BTreeSet<usize>,
    pub recurrences_run: u64,
    pub stats: DurationStats,
    pub error_count: u64,
    pub success: bool,
}

impl PlanEnvironmentResult {
    /// Combine executor results.
    ///
    /// min is the min of the executors' minimums, max the max of their
    /// maximums and average the mean of their averages. The median is taken
    /// over the pooled recurrence durations. Executors that ran no
    /// recurrence contribute their id and timestamps but no statistics.
    pub fn aggregate(
        environment_id: Uuid,
        plan_name: impl Into<String>,
        results: &[PlanExecutorResult],
    ) -> Self {
        let now = Utc::now();
        let started_at = results.iter().map(|r| r.started_at).min().unwrap_or(now);
        let finished_at = results.iter().map(|r| r.finished_at).max().unwrap_or(now);

        let measured: Vec<&PlanExecutorResult> =
            results.iter().filter(|r| r.recurrences_run > 0).collect();

        let stats = if measured.is_empty() {
            DurationStats::default()
        } else {
            let min = measured.iter().map(|r| r.stats.min).min().unwrap_or_default();
            let max = measured.iter().map(|r| r.stats.max).max().unwrap_or_default();
            let average =
                measured.iter().map(|r| r.stats.average).sum::<Duration>() / measured.len() as u32;

            let mut pooled: Vec<Duration> = measured
                .iter()
                .flat_map(|r| r.recurrence_durations.iter().copied())
                .collect();
            pooled.sort_unstable();
            let median = if pooled.is_empty() {
                // Results that crossed a wire carry no raw samples
                let mut medians: Vec<Duration> = measured.iter().map(|r| r.stats.median).collect();
                medians.sort_unstable();
                median_of_sorted(&medians)
            } else {
                median_of_sorted(&pooled)
            };

            DurationStats {
                min,
                max,
                average,
                median,
            }
        };

        let error_count = results.iter().map(|r| r.error_count).sum();

        Self {
            environment_id,
            plan_name: plan_name.into(),
            started_at,
            finished_at,
            executor_ids: results.iter().map(|r| r.executor_id).collect(),
            recurrences_run: results.iter().map(|r| r.recurrences_run).sum(),
            stats,
            error_count,
            success: results.iter().all(|r| r.success),
        }
    }

    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at).to_std().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn executor(id: usize, min: u64, max: u64, average: u64, errors: u64) -> PlanExecutorResult {
        let started_at = Utc::now() + ChronoDuration::milliseconds(id as i64);
        PlanExecutorResult {
            environment_id: Uuid::nil(),
            executor_id: id,
            plan_name: "plan".to_string(),
            started_at,
            finished_at: started_at + ChronoDuration::milliseconds(100),
            total_duration: ms(100),
            recurrences_run: 3,
            stats: DurationStats {
                min: ms(min),
                max: ms(max),
                average: ms(average),
                median: ms(average),
            },
            error_count: errors,
            success: errors == 0,
            interrupted: false,
            recurrence_durations: vec![ms(min), ms(average), ms(max)],
        }
    }

    #[test]
    fn test_stats_from_samples() {
        let stats = DurationStats::from_samples(&[ms(4), ms(1), ms(7), ms(4)]);
        assert_eq!(stats.min, ms(1));
        assert_eq!(stats.max, ms(7));
        assert_eq!(stats.average, ms(4));
        assert_eq!(stats.median, ms(4));

        let odd = DurationStats::from_samples(&[ms(9), ms(2), ms(3)]);
        assert_eq!(odd.median, ms(3));

        assert_eq!(DurationStats::from_samples(&[]), DurationStats::default());
    }

    #[test]
    fn test_aggregate_min_max_average() {
        let results = vec![
            executor(0, 2, 10, 6, 0),
            executor(1, 1, 8, 4, 2),
            executor(2, 3, 9, 5, 1),
        ];
        let aggregate = PlanEnvironmentResult::aggregate(Uuid::nil(), "plan", &results);

        assert_eq!(aggregate.stats.min, ms(1));
        assert_eq!(aggregate.stats.max, ms(10));
        assert_eq!(aggregate.stats.average, ms(5));
        assert_eq!(aggregate.error_count, 3);
        assert_eq!(aggregate.recurrences_run, 9);
        assert_eq!(aggregate.executor_ids, BTreeSet::from([0, 1, 2]));
        assert!(!aggregate.success);
    }

    #[test]
    fn test_aggregate_median_over_pooled_durations() {
        let results = vec![executor(0, 2, 10, 6, 0), executor(1, 1, 8, 4, 0)];
        // pooled: 1, 2, 4, 6, 8, 10
        let aggregate = PlanEnvironmentResult::aggregate(Uuid::nil(), "plan", &results);
        assert_eq!(aggregate.stats.median, ms(5));
        assert!(aggregate.success);
    }

    #[test]
    fn test_aggregate_timestamps_span_all_executors() {
        let results = vec![executor(5, 1, 1, 1, 0), executor(0, 1, 1, 1, 0)];
        let aggregate = PlanEnvironmentResult::aggregate(Uuid::nil(), "plan", &results);
        assert_eq!(aggregate.started_at, results[1].started_at);
        assert_eq!(aggregate.finished_at, results[0].finished_at);
    }

    #[test]
    fn test_executor_without_recurrences_does_not_skew_stats() {
        let mut idle = executor(1, 0, 0, 0, 0);
        idle.recurrences_run = 0;
        idle.recurrence_durations.clear();

        let results = vec![executor(0, 2, 10, 6, 0), idle];
        let aggregate = PlanEnvironmentResult::aggregate(Uuid::nil(), "plan", &results);
        assert_eq!(aggregate.stats.min, ms(2));
        assert_eq!(aggregate.stats.average, ms(6));
        assert_eq!(aggregate.executor_ids.len(), 2);
    }

    #[test]
    fn test_environment_result_json_uses_milliseconds() {
        let results = vec![executor(0, 2, 10, 6, 0)];
        let aggregate = PlanEnvironmentResult::aggregate(Uuid::nil(), "plan", &results);
        let json = serde_json::to_value(&aggregate).unwrap();
        assert_eq!(json["stats"]["max_ms"], serde_json::json!(10.0));

        let decoded: PlanEnvironmentResult = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.stats, aggregate.stats);
    }
}
