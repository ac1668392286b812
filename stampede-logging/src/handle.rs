//! Per-activity logging handles
//!
//! A handle is created for each logging activity when the plan is built and
//! owned by that activity, so there is no process-wide registry of named
//! loggers to mutate while executors are running.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::Level;

/// Target used for every line written through an activity handle
pub const ACTIVITY_LOG_TARGET: &str = "stampede::activity";

#[derive(Debug, Clone)]
pub struct ActivityLogHandle {
    activity: String,
    label: String,
    level: Level,
    emitted: Arc<AtomicU64>,
}

impl ActivityLogHandle {
    pub fn new(activity: impl Into<String>, label: impl Into<String>, level: Level) -> Self {
        Self {
            activity: activity.into(),
            label: label.into(),
            level,
            emitted: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Lines written through this handle or any of its clones
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    pub fn emit(&self, message: &str) {
        let activity = self.activity.as_str();
        let label = self.label.as_str();

        match self.level {
            Level::ERROR => tracing::error!(target: ACTIVITY_LOG_TARGET, activity, label, "{}", message),
            Level::WARN => tracing::warn!(target: ACTIVITY_LOG_TARGET, activity, label, "{}", message),
            Level::INFO => tracing::info!(target: ACTIVITY_LOG_TARGET, activity, label, "{}", message),
            Level::DEBUG => tracing::debug!(target: ACTIVITY_LOG_TARGET, activity, label, "{}", message),
            _ => tracing::trace!(target: ACTIVITY_LOG_TARGET, activity, label, "{}", message),
        }

        self.emitted.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counter() {
        let handle = ActivityLogHandle::new("greet", "checkout", Level::INFO);
        let clone = handle.clone();

        handle.emit("first");
        clone.emit("second");

        assert_eq!(handle.emitted(), 2);
        assert_eq!(clone.activity(), "greet");
        assert_eq!(clone.label(), "checkout");
    }
}
