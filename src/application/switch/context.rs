//! Per-navigation switch context.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::report::{FailedApp, StageFailure, SwitchReport};
use crate::domain::{AppName, MatchedResult, SwitchId};
use crate::error::LifecycleError;

#[derive(Debug, Default)]
struct SwitchProgress {
    batches_run: usize,
    mounted: Vec<AppName>,
    deferred: Vec<AppName>,
    failed: Vec<FailedApp>,
    unmounted: Vec<AppName>,
    unmount_failed: Vec<FailedApp>,
    unknown: Vec<AppName>,
    stage_errors: Vec<StageFailure>,
    cancelled: bool,
}

/// State of one switch, created per navigation event and dropped after it.
///
/// Carries the match result and accumulates what happened to each app.
#[derive(Debug)]
pub struct SwitchContext {
    id: SwitchId,
    matched: MatchedResult,
    generation: u64,
    latest: Arc<AtomicU64>,
    abandon_superseded: bool,
    started_at: DateTime<Utc>,
    progress: Mutex<SwitchProgress>,
}

impl SwitchContext {
    /// Context for a switch that nothing can preempt.
    #[must_use]
    pub fn new(matched: MatchedResult) -> Self {
        Self::for_generation(matched, 0, Arc::new(AtomicU64::new(0)), false)
    }

    /// Context for the `generation`-th switch of a switcher whose newest
    /// generation is tracked by `latest`.
    pub(crate) fn for_generation(
        matched: MatchedResult,
        generation: u64,
        latest: Arc<AtomicU64>,
        abandon_superseded: bool,
    ) -> Self {
        Self {
            id: SwitchId::new(),
            matched,
            generation,
            latest,
            abandon_superseded,
            started_at: Utc::now(),
            progress: Mutex::new(SwitchProgress::default()),
        }
    }

    #[must_use]
    pub fn id(&self) -> &SwitchId {
        &self.id
    }

    /// Match result this switch was started for.
    #[must_use]
    pub fn matched(&self) -> &MatchedResult {
        &self.matched
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// True once a newer switch has started.
    #[must_use]
    pub fn is_superseded(&self) -> bool {
        self.latest.load(Ordering::SeqCst) != self.generation
    }

    /// True when the remaining batches must not start.
    #[must_use]
    pub fn should_abandon(&self) -> bool {
        self.abandon_superseded && self.is_superseded()
    }

    pub(crate) fn record_batch(&self) {
        self.progress.lock().batches_run += 1;
    }

    pub(crate) fn record_mounted(&self, app: &AppName) {
        self.progress.lock().mounted.push(app.clone());
    }

    pub(crate) fn record_deferred(&self, app: &AppName) {
        self.progress.lock().deferred.push(app.clone());
    }

    pub(crate) fn record_failed(&self, app: &AppName, err: &LifecycleError) {
        self.progress.lock().failed.push(FailedApp {
            app: app.clone(),
            error: err.to_string(),
        });
    }

    pub(crate) fn record_unmounted(&self, app: &AppName) {
        self.progress.lock().unmounted.push(app.clone());
    }

    pub(crate) fn record_unmount_failed(&self, app: &AppName, err: &LifecycleError) {
        self.progress.lock().unmount_failed.push(FailedApp {
            app: app.clone(),
            error: err.to_string(),
        });
    }

    pub(crate) fn record_unknown(&self, app: AppName) {
        self.progress.lock().unknown.push(app);
    }

    pub(crate) fn record_stage_error(&self, stage: &str, batch: usize, err: &anyhow::Error) {
        self.progress.lock().stage_errors.push(StageFailure {
            stage: stage.to_string(),
            batch,
            error: format!("{err:#}"),
        });
    }

    pub(crate) fn mark_cancelled(&self) {
        self.progress.lock().cancelled = true;
    }

    /// Summary of everything recorded so far.
    #[must_use]
    pub fn report(&self, batches_planned: usize) -> SwitchReport {
        let progress = self.progress.lock();
        SwitchReport {
            id: self.id.clone(),
            started_at: self.started_at,
            finished_at: Utc::now(),
            batches_planned,
            batches_run: progress.batches_run,
            mounted: progress.mounted.clone(),
            deferred: progress.deferred.clone(),
            failed: progress.failed.clone(),
            unmounted: progress.unmounted.clone(),
            unmount_failed: progress.unmount_failed.clone(),
            unknown: progress.unknown.clone(),
            stage_errors: progress.stage_errors.clone(),
            cancelled: progress.cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standalone_context_is_never_superseded() {
        let ctx = SwitchContext::new(MatchedResult::default());
        assert!(!ctx.is_superseded());
        assert!(!ctx.should_abandon());
    }

    #[test]
    fn newer_generation_supersedes() {
        let latest = Arc::new(AtomicU64::new(1));
        let ctx = SwitchContext::for_generation(MatchedResult::default(), 1, Arc::clone(&latest), true);
        assert!(!ctx.should_abandon());

        latest.store(2, Ordering::SeqCst);
        assert!(ctx.is_superseded());
        assert!(ctx.should_abandon());
    }

    #[test]
    fn report_collects_progress() {
        let ctx = SwitchContext::new(MatchedResult::default());
        ctx.record_batch();
        ctx.record_mounted(&AppName::new("shell"));
        ctx.record_unknown(AppName::new("ghost"));

        let report = ctx.report(2);

        assert_eq!(report.batches_planned, 2);
        assert_eq!(report.batches_run, 1);
        assert_eq!(report.mounted, vec!["shell"]);
        assert!(!report.is_clean());
    }
}
