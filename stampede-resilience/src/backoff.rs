//! Backoff strategies for retry policies

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the delay grows between attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay before every retry
    Fixed,

    /// delay = initial_delay * attempt
    Linear,

    /// delay = initial_delay * base^(attempt-1)
    Exponential { base: f64 },
}

/// Computes the delay before a given retry attempt
#[derive(Debug, Clone)]
pub struct BackoffCalculator {
    strategy: BackoffStrategy,
    initial_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl BackoffCalculator {
    pub fn new(
        strategy: BackoffStrategy,
        initial_delay: Duration,
        max_delay: Duration,
        jitter: bool,
    ) -> Self {
        Self {
            strategy,
            initial_delay,
            max_delay,
            jitter,
        }
    }

    /// Delay after the given failed attempt (1-indexed), capped at the
    /// maximum delay before jitter is applied
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let delay = self.base_delay(attempt).min(self.max_delay);

        if self.jitter {
            jittered(delay)
        } else {
            delay
        }
    }

    fn base_delay(&self, attempt: u32) -> Duration {
        match self.strategy {
            BackoffStrategy::Fixed => self.initial_delay,
            BackoffStrategy::Linear => self.initial_delay.saturating_mul(attempt),
            BackoffStrategy::Exponential { base } => {
                if attempt == 0 {
                    return Duration::ZERO;
                }
                let factor = base.powi(attempt as i32 - 1);
                let nanos = self.initial_delay.as_nanos() as f64 * factor;
                if nanos >= u64::MAX as f64 {
                    self.max_delay
                } else {
                    Duration::from_nanos(nanos as u64)
                }
            }
        }
    }
}

/// +/-20% spread so that many pollers do not retry in lockstep
fn jittered(delay: Duration) -> Duration {
    let factor = rand::thread_rng().gen_range(0.8..1.2);
    Duration::from_nanos((delay.as_nanos() as f64 * factor) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator(strategy: BackoffStrategy, max: Duration) -> BackoffCalculator {
        BackoffCalculator::new(strategy, Duration::from_millis(100), max, false)
    }

    #[test]
    fn test_fixed_backoff() {
        let calc = calculator(BackoffStrategy::Fixed, Duration::from_secs(1));
        assert_eq!(calc.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(calc.calculate_delay(7), Duration::from_millis(100));
    }

    #[test]
    fn test_linear_backoff_is_capped() {
        let calc = calculator(BackoffStrategy::Linear, Duration::from_secs(1));
        assert_eq!(calc.calculate_delay(3), Duration::from_millis(300));
        assert_eq!(calc.calculate_delay(50), Duration::from_secs(1));
    }

    #[test]
    fn test_exponential_backoff() {
        let calc = calculator(
            BackoffStrategy::Exponential { base: 2.0 },
            Duration::from_millis(500),
        );
        assert_eq!(calc.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(calc.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(calc.calculate_delay(3), Duration::from_millis(400));
        assert_eq!(calc.calculate_delay(4), Duration::from_millis(500));
        assert_eq!(calc.calculate_delay(200), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let calc = BackoffCalculator::new(
            BackoffStrategy::Fixed,
            Duration::from_millis(1000),
            Duration::from_secs(10),
            true,
        );
        for _ in 0..20 {
            let delay = calc.calculate_delay(1);
            assert!(delay >= Duration::from_millis(800));
            assert!(delay <= Duration::from_millis(1200));
        }
    }
}
