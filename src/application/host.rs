//! Entry point a host program talks to.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::application::app::{App, AppConfig};
use crate::application::registry::AppRegistry;
use crate::application::switch::{
    AppSwitcher, ChildContainerStage, GroupPlan, LoadPipeline, LoadStage, SwitchReport,
};
use crate::domain::{AppName, AppSnapshot, AppStatus, MatchedResult};
use crate::error::RegistryError;
use crate::port::{ContainerWaitHook, NoopContainerWait, NoopRouter, RerouteTrigger, Router};

/// Registry, router and switcher of one host program.
pub struct Host {
    registry: AppRegistry,
    switcher: AppSwitcher,
    router: Arc<dyn Router>,
}

impl Host {
    #[must_use]
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    #[must_use]
    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    #[must_use]
    pub fn switcher(&self) -> &AppSwitcher {
        &self.switcher
    }

    /// Register a top-level app.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] when the name is taken.
    pub fn register_app(&self, config: AppConfig) -> Result<Arc<App>, RegistryError> {
        self.registry.register(config)
    }

    /// Register several top-level apps with a single reroute.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] for the first taken name.
    pub fn register_apps<I>(&self, configs: I) -> Result<Vec<Arc<App>>, RegistryError>
    where
        I: IntoIterator<Item = AppConfig>,
    {
        self.registry.register_many(configs)
    }

    /// Register an app that is mounted by hand rather than by routing.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] when the name is taken.
    pub fn register_root_parcel(&self, config: AppConfig) -> Result<Arc<App>, RegistryError> {
        self.registry.register_root_parcel(config)
    }

    /// # Errors
    ///
    /// [`RegistryError::NotFound`] when no app has that name.
    pub fn get_app(&self, name: &str) -> Result<Arc<App>, RegistryError> {
        self.registry.get(name)
    }

    /// Append a stage to the load pipeline.
    pub fn use_stage(&mut self, stage: Arc<dyn LoadStage>) {
        self.switcher.use_stage(stage);
    }

    /// Ask the router for the first navigation.
    pub fn start(&self) {
        info!(apps = self.registry.len(), "Host started");
        self.router.reroute(RerouteTrigger::Start);
    }

    /// Switch to the apps of `matched`.
    pub async fn switch(&self, matched: MatchedResult) -> SwitchReport {
        self.switcher.switch(matched).await
    }

    /// Plan `matched` without running it.
    #[must_use]
    pub fn plan(&self, matched: &MatchedResult) -> (GroupPlan, Vec<AppName>) {
        self.switcher.plan(matched)
    }

    /// Load apps ahead of navigation.
    ///
    /// Apps that are already loaded are skipped and load failures are only
    /// logged; a later switch retries them.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] for an unknown name, before anything loads.
    pub async fn prefetch<I, S>(&self, names: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let apps = names
            .into_iter()
            .map(|name| self.registry.get(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        join_all(
            apps.iter()
                .filter(|app| {
                    matches!(
                        app.status(),
                        AppStatus::NotLoaded | AppStatus::LoadError | AppStatus::LoadingSourceCode
                    )
                })
                .map(|app| async move {
                    if let Err(err) = app.load(None).await {
                        warn!(app = %app.name(), error = %err, "Prefetch failed");
                    }
                }),
        )
        .await;
        Ok(())
    }

    /// Diagnostic view of every registered app.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AppSnapshot> {
        self.registry.snapshot()
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("registry", &self.registry)
            .field("switcher", &self.switcher)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Host`].
pub struct HostBuilder {
    router: Arc<dyn Router>,
    container_wait: Arc<dyn ContainerWaitHook>,
    stages: Vec<Arc<dyn LoadStage>>,
    abandon_superseded: bool,
    wait_for_child_containers: bool,
}

impl HostBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            router: Arc::new(NoopRouter),
            container_wait: Arc::new(NoopContainerWait),
            stages: Vec::new(),
            abandon_superseded: true,
            wait_for_child_containers: true,
        }
    }

    #[must_use]
    pub fn router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = router;
        self
    }

    /// Fallback used when a parent app has no container controller.
    #[must_use]
    pub fn container_wait(mut self, hook: Arc<dyn ContainerWaitHook>) -> Self {
        self.container_wait = hook;
        self
    }

    #[must_use]
    pub fn stage(mut self, stage: Arc<dyn LoadStage>) -> Self {
        self.stages.push(stage);
        self
    }

    #[must_use]
    pub fn abandon_superseded(mut self, enabled: bool) -> Self {
        self.abandon_superseded = enabled;
        self
    }

    /// Install [`ChildContainerStage`] ahead of user stages.
    #[must_use]
    pub fn wait_for_child_containers(mut self, enabled: bool) -> Self {
        self.wait_for_child_containers = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> Host {
        let registry = AppRegistry::new(Arc::clone(&self.router), self.container_wait);

        let mut pipeline = LoadPipeline::new();
        if self.wait_for_child_containers {
            pipeline.register(Arc::new(ChildContainerStage));
        }
        for stage in self.stages {
            pipeline.register(stage);
        }

        Host {
            switcher: AppSwitcher::new(registry.clone(), pipeline, self.abandon_superseded),
            registry,
            router: self.router,
        }
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}
