//! Batch-by-batch load pipeline with pluggable stages.
//!
//! The pipeline walks a [`GroupPlan`] in order. For every batch it runs each
//! stage's `before_batch` in registration order, activates the batch
//! concurrently, then runs `after_batch` in reverse order. A stage error is
//! logged and recorded on the switch; it never aborts the pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, error, info, warn};

use super::context::SwitchContext;
use super::plan::{GroupPlan, PlannedApp};
use crate::domain::{AppName, AppStatus, MatchedResult, Operation};
use crate::error::LifecycleError;

/// Mutable context handed to every stage of one switch.
#[derive(Debug)]
pub struct LoadHookContext {
    pub switch: Arc<SwitchContext>,
    /// Full plan of the switch.
    pub target_apps: GroupPlan,
    /// Batch about to be (or just) activated.
    pub current_apps: Vec<PlannedApp>,
    pub batch_index: usize,
}

impl LoadHookContext {
    #[must_use]
    pub fn new(switch: Arc<SwitchContext>, target_apps: GroupPlan) -> Self {
        Self {
            switch,
            target_apps,
            current_apps: Vec::new(),
            batch_index: 0,
        }
    }

    #[must_use]
    pub fn matched(&self) -> &MatchedResult {
        self.switch.matched()
    }
}

/// Result of activating one batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub index: usize,
    pub results: Vec<(AppName, Result<(), LifecycleError>)>,
}

impl BatchOutcome {
    /// Apps that ended the batch mounted, deferred ones included.
    #[must_use]
    pub fn activated(&self) -> Vec<&AppName> {
        self.results
            .iter()
            .filter(|(_, result)| match result {
                Ok(()) => true,
                Err(err) => err.is_container_not_found(),
            })
            .map(|(name, _)| name)
            .collect()
    }

    /// Apps whose activation failed.
    #[must_use]
    pub fn failed(&self) -> Vec<&AppName> {
        self.results
            .iter()
            .filter(|(_, result)| matches!(result, Err(err) if !err.is_container_not_found()))
            .map(|(name, _)| name)
            .collect()
    }
}

/// A hook around every batch of a switch.
///
/// Both methods default to doing nothing.
#[async_trait]
pub trait LoadStage: Send + Sync {
    /// Stage name used in logs and reports.
    fn name(&self) -> &str;

    async fn before_batch(&self, _ctx: &mut LoadHookContext) -> anyhow::Result<()> {
        Ok(())
    }

    async fn after_batch(
        &self,
        _ctx: &mut LoadHookContext,
        _outcome: &BatchOutcome,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Ordered list of stages.
#[derive(Default, Clone)]
pub struct LoadPipeline {
    stages: Vec<Arc<dyn LoadStage>>,
}

impl LoadPipeline {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn register(&mut self, stage: Arc<dyn LoadStage>) {
        debug!(stage = stage.name(), "Load stage registered");
        self.stages.push(stage);
    }

    #[must_use]
    pub fn with_stage(mut self, stage: Arc<dyn LoadStage>) -> Self {
        self.register(stage);
        self
    }

    /// Stage names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Activate every batch of `ctx.target_apps`.
    ///
    /// Stops before a batch when the switch has been superseded and
    /// abandoning is enabled; the batch in flight always finishes.
    pub async fn run(&self, ctx: &mut LoadHookContext) {
        for index in 0..ctx.target_apps.len() {
            if ctx.switch.should_abandon() {
                info!(
                    switch = %ctx.switch.id(),
                    batch = index,
                    "Switch superseded, abandoning remaining batches"
                );
                ctx.switch.mark_cancelled();
                break;
            }

            ctx.batch_index = index;
            ctx.current_apps = ctx.target_apps.batch(index).to_vec();
            debug!(
                switch = %ctx.switch.id(),
                batch = index,
                apps = ctx.current_apps.len(),
                "Activating batch"
            );

            for stage in &self.stages {
                if let Err(err) = stage.before_batch(ctx).await {
                    warn!(stage = stage.name(), batch = index, error = %err, "Stage failed before batch");
                    ctx.switch.record_stage_error(stage.name(), index, &err);
                }
            }

            let outcome = activate_batch(ctx).await;

            for stage in self.stages.iter().rev() {
                if let Err(err) = stage.after_batch(ctx, &outcome).await {
                    warn!(stage = stage.name(), batch = index, error = %err, "Stage failed after batch");
                    ctx.switch.record_stage_error(stage.name(), index, &err);
                }
            }

            ctx.switch.record_batch();
        }
        ctx.current_apps.clear();
    }
}

impl std::fmt::Debug for LoadPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadPipeline")
            .field("stages", &self.names())
            .finish()
    }
}

async fn activate_batch(ctx: &LoadHookContext) -> BatchOutcome {
    let switch = ctx.switch.as_ref();
    let results = join_all(ctx.current_apps.iter().map(|planned| async move {
        (planned.name().clone(), activate(planned, switch).await)
    }))
    .await;

    for (name, result) in &results {
        match result {
            Ok(()) => switch.record_mounted(name),
            Err(err) if err.is_container_not_found() => {
                warn!(app = %name, error = %err, "App mounted without its container");
                switch.record_deferred(name);
            }
            Err(err) => {
                error!(app = %name, error = %err, "App failed to activate");
                switch.record_failed(name, err);
            }
        }
    }

    BatchOutcome {
        index: ctx.batch_index,
        results,
    }
}

/// Bring one app to `MOUNTED` from whatever status it is in.
async fn activate(planned: &PlannedApp, switch: &SwitchContext) -> Result<(), LifecycleError> {
    let app = &planned.app;

    // Deselected by an earlier switch and selected again.
    if app.status() == AppStatus::Unmounting {
        app.unmount(Some(switch), None).await?;
    }

    if matches!(
        app.status(),
        AppStatus::NotLoaded | AppStatus::LoadError | AppStatus::LoadingSourceCode
    ) {
        app.load(Some(switch)).await?;
    }

    match app.status() {
        AppStatus::NotMounted | AppStatus::Mounting => {
            app.mount(Some(switch), planned.route.as_ref()).await
        }
        AppStatus::Mounted => Ok(()),
        status => Err(LifecycleError::InvalidStateTransition {
            app: app.name().clone(),
            operation: Operation::Mount,
            status,
        }),
    }
}
