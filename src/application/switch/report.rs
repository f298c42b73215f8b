//! Outcome of one switch.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{AppName, SwitchId};

/// An app that failed during a switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedApp {
    pub app: AppName,
    pub error: String,
}

/// A pipeline stage that returned an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: String,
    pub batch: usize,
    pub error: String,
}

/// Summary of a finished switch, suitable for logs and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct SwitchReport {
    pub id: SwitchId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub batches_planned: usize,
    pub batches_run: usize,
    /// Apps that ended mounted, in settle order.
    pub mounted: Vec<AppName>,
    /// Apps mounted without their container; completion is deferred.
    pub deferred: Vec<AppName>,
    /// Apps that failed to load or mount.
    pub failed: Vec<FailedApp>,
    /// Deselected apps that were unmounted.
    pub unmounted: Vec<AppName>,
    /// Deselected apps that failed to unmount.
    pub unmount_failed: Vec<FailedApp>,
    /// Names in the match result that are not registered.
    pub unknown: Vec<AppName>,
    pub stage_errors: Vec<StageFailure>,
    /// True when a newer switch preempted this one before all batches ran.
    pub cancelled: bool,
}

impl SwitchReport {
    /// True when nothing failed and every planned batch ran.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.cancelled
            && self.failed.is_empty()
            && self.unmount_failed.is_empty()
            && self.unknown.is_empty()
            && self.stage_errors.is_empty()
    }

    /// True when `name` failed to load or mount.
    #[must_use]
    pub fn has_failed(&self, name: &str) -> bool {
        self.failed.iter().any(|failed| failed.app == name)
    }
}
