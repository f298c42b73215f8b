//! Simulated application bundles.
//!
//! A [`SimulatedApp`] turns a declarative [`SimulatedAppSpec`] into an
//! [`AppConfig`] whose lifecycle functions sleep for the configured delays,
//! fail on request and record every call into a shared [`EventLog`].

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::application::AppConfig;
use crate::domain::{AppName, RouteConfig};
use crate::port::{AppProps, ContainerController, HookError, LifeCycles, MountResult};

/// What a simulated app does when driven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulatedAppSpec {
    pub name: AppName,
    #[serde(default)]
    pub load_ms: u64,
    #[serde(default)]
    pub mount_ms: u64,
    #[serde(default)]
    pub unmount_ms: u64,
    /// Number of leading load attempts that fail.
    #[serde(default)]
    pub load_failures: u32,
    #[serde(default)]
    pub fail_mount: bool,
    /// Mount reports this container as missing.
    #[serde(default)]
    pub missing_container: Option<String>,
    /// Containers this app provides to nested apps once mounted.
    #[serde(default)]
    pub containers: Vec<String>,
    /// Delay before a provided container is ready.
    #[serde(default)]
    pub container_ms: u64,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl SimulatedAppSpec {
    /// Instant app that never fails.
    #[must_use]
    pub fn new(name: impl Into<AppName>) -> Self {
        Self {
            name: name.into(),
            load_ms: 0,
            mount_ms: 0,
            unmount_ms: 0,
            load_failures: 0,
            fail_mount: false,
            missing_container: None,
            containers: Vec::new(),
            container_ms: 0,
            routes: Vec::new(),
        }
    }
}

/// A lifecycle call observed by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    LoadStarted,
    LoadFinished,
    LoadFailed,
    MountStarted,
    MountFinished,
    MountFailed,
    UnmountStarted,
    UnmountFinished,
    ContainerReady,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimEvent {
    pub app: AppName,
    pub phase: Phase,
    /// Milliseconds since the log was created.
    pub at_ms: u64,
}

/// Shared, ordered record of simulated lifecycle calls.
#[derive(Debug, Clone)]
pub struct EventLog {
    started: Instant,
    events: Arc<Mutex<Vec<SimEvent>>>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn record(&self, app: &AppName, phase: Phase) {
        let at_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.events.lock().push(SimEvent {
            app: app.clone(),
            phase,
            at_ms,
        });
    }

    #[must_use]
    pub fn events(&self) -> Vec<SimEvent> {
        self.events.lock().clone()
    }

    /// Position of the first `phase` event of `app`.
    #[must_use]
    pub fn position(&self, app: &str, phase: Phase) -> Option<usize> {
        self.events
            .lock()
            .iter()
            .position(|event| event.app == app && event.phase == phase)
    }

    /// How many `phase` events `app` produced.
    #[must_use]
    pub fn count(&self, app: &str, phase: Phase) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.app == app && event.phase == phase)
            .count()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

/// A simulated application bundle.
#[derive(Debug, Clone)]
pub struct SimulatedApp {
    spec: Arc<SimulatedAppSpec>,
    log: EventLog,
    load_attempts: Arc<AtomicU32>,
}

impl SimulatedApp {
    #[must_use]
    pub fn new(spec: SimulatedAppSpec, log: EventLog) -> Self {
        Self {
            spec: Arc::new(spec),
            log,
            load_attempts: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Registration config for this app.
    #[must_use]
    pub fn app_config(&self) -> AppConfig {
        let sim = self.clone();
        let config = AppConfig::new(self.spec.name.clone()).with_loader(move |_props| {
            let sim = sim.clone();
            async move { sim.load().await }
        });
        self.spec
            .routes
            .iter()
            .cloned()
            .fold(config, AppConfig::with_route)
    }

    async fn load(self) -> Result<LifeCycles, HookError> {
        let spec = &self.spec;
        let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst);
        self.log.record(&spec.name, Phase::LoadStarted);
        sleep_ms(spec.load_ms).await;

        if attempt < spec.load_failures {
            self.log.record(&spec.name, Phase::LoadFailed);
            return Err(HookError::msg(format!(
                "simulated load failure {} of {}",
                attempt + 1,
                spec.load_failures
            )));
        }
        self.log.record(&spec.name, Phase::LoadFinished);

        let sim = self.clone();
        let lifecycles = LifeCycles::new().with_mount(move |_props| {
            let sim = sim.clone();
            async move { sim.mount().await }
        });

        let sim = self.clone();
        Ok(lifecycles.with_unmount(move |_props| {
            let sim = sim.clone();
            async move { sim.unmount().await }
        }))
    }

    async fn mount(self) -> Result<MountResult, HookError> {
        let spec = &self.spec;
        self.log.record(&spec.name, Phase::MountStarted);
        sleep_ms(spec.mount_ms).await;

        if spec.fail_mount {
            self.log.record(&spec.name, Phase::MountFailed);
            return Err(HookError::msg("simulated mount failure"));
        }
        if let Some(container) = &spec.missing_container {
            self.log.record(&spec.name, Phase::MountFailed);
            return Err(HookError::container_not_found(container.clone()));
        }
        self.log.record(&spec.name, Phase::MountFinished);

        if spec.containers.is_empty() {
            Ok(MountResult::default())
        } else {
            Ok(MountResult::with_controller(Arc::new(SimulatedContainers {
                app: spec.name.clone(),
                containers: spec.containers.clone(),
                delay_ms: spec.container_ms,
                log: self.log.clone(),
            })))
        }
    }

    async fn unmount(self) -> Result<(), HookError> {
        let spec = &self.spec;
        self.log.record(&spec.name, Phase::UnmountStarted);
        sleep_ms(spec.unmount_ms).await;
        self.log.record(&spec.name, Phase::UnmountFinished);
        Ok(())
    }
}

/// Container controller of a mounted simulated app.
struct SimulatedContainers {
    app: AppName,
    containers: Vec<String>,
    delay_ms: u64,
    log: EventLog,
}

#[async_trait]
impl ContainerController for SimulatedContainers {
    async fn wait(&self, container: &str, _props: &AppProps) -> Result<(), HookError> {
        if !self.containers.iter().any(|c| c == container) {
            return Err(HookError::container_not_found(container));
        }
        sleep_ms(self.delay_ms).await;
        self.log.record(&self.app, Phase::ContainerReady);
        Ok(())
    }
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AppStatus;
    use crate::port::{NoopContainerWait, NoopRouter};
    use crate::application::AppRegistry;

    fn registry() -> AppRegistry {
        AppRegistry::new(Arc::new(NoopRouter), Arc::new(NoopContainerWait))
    }

    #[test]
    fn spec_parses_with_defaults() {
        let spec: SimulatedAppSpec = toml::from_str("name = \"orders\"\nmount_ms = 5").unwrap();
        assert_eq!(spec.name, "orders");
        assert_eq!(spec.mount_ms, 5);
        assert!(!spec.fail_mount);
        assert!(spec.containers.is_empty());
    }

    #[tokio::test]
    async fn drives_full_lifecycle() {
        let log = EventLog::new();
        let sim = SimulatedApp::new(SimulatedAppSpec::new("orders"), log.clone());
        let app = registry().register(sim.app_config()).unwrap();

        app.load(None).await.unwrap();
        app.mount(None, None).await.unwrap();
        app.unmount(None, None).await.unwrap();

        let phases: Vec<_> = log.events().into_iter().map(|e| e.phase).collect();
        assert_eq!(
            phases,
            vec![
                Phase::LoadStarted,
                Phase::LoadFinished,
                Phase::MountStarted,
                Phase::MountFinished,
                Phase::UnmountStarted,
                Phase::UnmountFinished,
            ]
        );
    }

    #[tokio::test]
    async fn load_failures_then_success() {
        let log = EventLog::new();
        let sim = SimulatedApp::new(
            SimulatedAppSpec {
                load_failures: 1,
                ..SimulatedAppSpec::new("flaky")
            },
            log.clone(),
        );
        let app = registry().register(sim.app_config()).unwrap();

        assert!(app.load(None).await.is_err());
        assert_eq!(app.status(), AppStatus::LoadError);
        app.load(None).await.unwrap();
        assert_eq!(log.count("flaky", Phase::LoadStarted), 2);
        assert_eq!(log.count("flaky", Phase::LoadFailed), 1);
    }

    #[tokio::test]
    async fn unknown_container_is_not_found() {
        let log = EventLog::new();
        let sim = SimulatedApp::new(
            SimulatedAppSpec {
                containers: vec!["main".into()],
                ..SimulatedAppSpec::new("shell")
            },
            log.clone(),
        );
        let app = registry().register(sim.app_config()).unwrap();
        app.load(None).await.unwrap();
        app.mount(None, None).await.unwrap();

        app.wait_for_child_container("main", None).await.unwrap();
        let err = app.wait_for_child_container("aside", None).await.unwrap_err();

        assert!(err.is_container_not_found());
        assert_eq!(log.count("shell", Phase::ContainerReady), 1);
    }
}
