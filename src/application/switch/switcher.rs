//! Drives a navigation: unmount what was deselected, activate what matched.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, info};

use super::context::SwitchContext;
use super::pipeline::{LoadHookContext, LoadPipeline, LoadStage};
use super::plan::GroupPlan;
use super::report::SwitchReport;
use crate::application::app::App;
use crate::application::registry::AppRegistry;
use crate::domain::{AppName, AppStatus, MatchedResult};

/// Switches the active set of apps on every navigation.
///
/// Overlapping switches are allowed. Each gets a generation number; an
/// older switch notices a newer one between batches. A switch unmounts what
/// it deselected only after every older pipeline has stopped, so an app the
/// older switch was still activating is unmounted once it settles.
pub struct AppSwitcher {
    registry: AppRegistry,
    pipeline: LoadPipeline,
    latest: Arc<AtomicU64>,
    active: Mutex<Vec<Arc<App>>>,
    /// Flips to `true` once the pipeline of the latest switch and of every
    /// switch before it has stopped.
    settled: Mutex<Option<watch::Receiver<bool>>>,
    abandon_superseded: bool,
}

impl AppSwitcher {
    #[must_use]
    pub fn new(registry: AppRegistry, pipeline: LoadPipeline, abandon_superseded: bool) -> Self {
        Self {
            registry,
            pipeline,
            latest: Arc::new(AtomicU64::new(0)),
            active: Mutex::new(Vec::new()),
            settled: Mutex::new(None),
            abandon_superseded,
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> &LoadPipeline {
        &self.pipeline
    }

    pub fn use_stage(&mut self, stage: Arc<dyn LoadStage>) {
        self.pipeline.register(stage);
    }

    /// Names of the apps the latest switch selected.
    #[must_use]
    pub fn active(&self) -> Vec<AppName> {
        self.active.lock().iter().map(|app| app.name().clone()).collect()
    }

    /// Plan `matched` against the registry without running it.
    #[must_use]
    pub fn plan(&self, matched: &MatchedResult) -> (GroupPlan, Vec<AppName>) {
        GroupPlan::from_matched(matched, &self.registry)
    }

    /// Switch to the apps of `matched`.
    pub async fn switch(&self, matched: MatchedResult) -> SwitchReport {
        let (plan, unknown) = self.plan(&matched);
        self.execute(matched, plan, unknown).await
    }

    /// Switch to an explicitly grouped plan.
    pub async fn run_plan(&self, plan: GroupPlan) -> SwitchReport {
        self.execute(MatchedResult::default(), plan, Vec::new()).await
    }

    async fn execute(
        &self,
        matched: MatchedResult,
        plan: GroupPlan,
        unknown: Vec<AppName>,
    ) -> SwitchReport {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let switch = Arc::new(SwitchContext::for_generation(
            matched,
            generation,
            Arc::clone(&self.latest),
            self.abandon_superseded,
        ));
        for name in unknown {
            switch.record_unknown(name);
        }

        let (settled_tx, settled_rx) = watch::channel(false);
        let (deselected, previous) = {
            let targets = plan.apps();
            let mut active = self.active.lock();
            let deselected: Vec<_> = active
                .iter()
                .filter(|app| !targets.iter().any(|target| Arc::ptr_eq(app, target)))
                .cloned()
                .collect();
            *active = targets;
            (deselected, self.settled.lock().replace(settled_rx))
        };

        let batches_planned = plan.len();
        info!(
            switch = %switch.id(),
            generation,
            batches = batches_planned,
            deselected = deselected.len(),
            "Switch started"
        );

        let mut ctx = LoadHookContext::new(Arc::clone(&switch), plan);
        tokio::join!(
            self.unmount_deselected(&switch, previous.clone(), deselected),
            async {
                self.pipeline.run(&mut ctx).await;
                wait_settled(previous).await;
                settled_tx.send_replace(true);
            }
        );

        let report = switch.report(batches_planned);
        info!(
            switch = %switch.id(),
            mounted = report.mounted.len(),
            deferred = report.deferred.len(),
            failed = report.failed.len(),
            unmounted = report.unmounted.len(),
            cancelled = report.cancelled,
            "Switch finished"
        );
        report
    }

    async fn unmount_deselected(
        &self,
        switch: &Arc<SwitchContext>,
        previous: Option<watch::Receiver<bool>>,
        apps: Vec<Arc<App>>,
    ) {
        if apps.is_empty() {
            return;
        }
        if previous.is_some() {
            debug!(switch = %switch.id(), "Waiting for earlier switches to settle");
        }
        wait_settled(previous).await;

        // A newer switch may have selected an app again while we waited.
        let apps: Vec<_> = {
            let active = self.active.lock();
            apps.into_iter()
                .filter(|app| !active.iter().any(|selected| Arc::ptr_eq(selected, app)))
                .filter(|app| {
                    matches!(
                        app.status(),
                        AppStatus::Mounting | AppStatus::Mounted | AppStatus::Unmounting
                    )
                })
                .collect()
        };

        let results = join_all(
            apps.iter()
                .map(|app| app.settle_and_unmount(Some(Arc::clone(switch)))),
        )
        .await;

        for (app, result) in apps.iter().zip(results) {
            match result {
                Ok(()) => switch.record_unmounted(app.name()),
                Err(err) => {
                    error!(app = %app.name(), error = %err, "App failed to unmount");
                    switch.record_unmount_failed(app.name(), &err);
                }
            }
        }
    }
}

impl std::fmt::Debug for AppSwitcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppSwitcher")
            .field("pipeline", &self.pipeline)
            .field("active", &self.active())
            .field("abandon_superseded", &self.abandon_superseded)
            .finish_non_exhaustive()
    }
}

/// Wait until the pipelines behind `settled` have stopped. A dropped
/// sender counts as stopped.
async fn wait_settled(settled: Option<watch::Receiver<bool>>) {
    if let Some(mut settled) = settled {
        let _ = settled.wait_for(|done| *done).await;
    }
}
