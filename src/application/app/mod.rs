//! Application state machine.
//!
//! An [`App`] wraps one sub-application: its loader, the lifecycle functions
//! the loader returns, its status and its parcels. The status moves only
//! inside the operation bodies below:
//!
//! ```text
//! load:     NOT_LOADED | LOAD_ERROR -> LOADING_SOURCE_CODE -> NOT_MOUNTED | LOAD_ERROR
//! mount:    NOT_MOUNTED -> MOUNTING -> MOUNTED | BROKEN
//! unmount:  MOUNTED -> UNMOUNTING -> NOT_MOUNTED | BROKEN
//! ```
//!
//! Concurrent calls of the same operation on one app share a single run of
//! the body (see [`inflight`]). The operation methods attach to that run when
//! they are called, not when the returned future is first polled.

mod config;
mod inflight;

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};

use futures_util::future::{join_all, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tracing::{debug, error, warn};

pub use config::{AppConfig, AppConfigProps, PropsFn};

use inflight::{InFlight, OperationKey, Outcome};

use crate::application::registry::{AppRegistry, RegistryInner};
use crate::application::switch::SwitchContext;
use crate::domain::{AppName, AppSnapshot, AppStatus, MatchedRoute, Operation};
use crate::error::{LifecycleError, RegistryError};
use crate::port::{
    AppProps, ContainerController, ContainerWaitHook, ContainerWaitRequest, HookError,
    LifeCycles, LoadFn,
};

/// Collaborators an app needs, passed explicitly at construction.
pub(crate) struct AppDependencies {
    pub(crate) registry: Weak<RegistryInner>,
    pub(crate) container_wait: Arc<dyn ContainerWaitHook>,
}

/// Mutable part of an app, guarded by one lock that is never held across an
/// await point.
#[derive(Default)]
struct LifecycleCell {
    status: AppStatus,
    is_loaded: bool,
    lifecycles: LifeCycles,
    container_controller: Option<Arc<dyn ContainerController>>,
}

/// One independently loaded sub-application.
pub struct App {
    name: AppName,
    props: AppConfigProps,
    loader: Option<LoadFn>,
    cell: Mutex<LifecycleCell>,
    parcels: Mutex<Vec<Arc<App>>>,
    in_flight: InFlight,
    registry: Weak<RegistryInner>,
    container_wait: Arc<dyn ContainerWaitHook>,
}

impl App {
    pub(crate) fn new(config: AppConfig, deps: AppDependencies) -> Self {
        Self {
            name: config.name,
            props: config.props,
            loader: config.loader,
            cell: Mutex::new(LifecycleCell::default()),
            parcels: Mutex::new(Vec::new()),
            in_flight: InFlight::default(),
            registry: deps.registry,
            container_wait: deps.container_wait,
        }
    }

    #[must_use]
    pub fn name(&self) -> &AppName {
        &self.name
    }

    #[must_use]
    pub fn status(&self) -> AppStatus {
        self.cell.lock().status
    }

    /// True once a load has succeeded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.lock().is_loaded
    }

    /// Parcels created through this app, in creation order.
    #[must_use]
    pub fn parcels(&self) -> Vec<Arc<App>> {
        self.parcels.lock().clone()
    }

    /// True while a call of `operation` is running on this app.
    #[must_use]
    pub fn is_pending(&self, operation: Operation) -> bool {
        self.in_flight.is_pending(operation)
    }

    /// Diagnostic view of this app.
    #[must_use]
    pub fn snapshot(&self) -> AppSnapshot {
        let cell = self.cell.lock();
        AppSnapshot {
            name: self.name.clone(),
            status: cell.status,
            is_loaded: cell.is_loaded,
            has_mount: cell.lifecycles.has_mount(),
            has_unmount: cell.lifecycles.has_unmount(),
            has_container_controller: cell.container_controller.is_some(),
            parcels: self
                .parcels
                .lock()
                .iter()
                .map(|parcel| parcel.name.clone())
                .collect(),
        }
    }

    /// Properties for a lifecycle call made during `switch` for `route`.
    #[must_use]
    pub fn props(&self, switch: Option<&SwitchContext>, route: Option<&MatchedRoute>) -> AppProps {
        AppProps {
            name: self.name.clone(),
            props: self.props.resolve(&self.name),
            switch_id: switch.map(|s| s.id().clone()),
            route: route.map(MatchedRoute::without_children),
        }
    }

    /// Load the app's source and keep the lifecycle functions it returns.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::InvalidStateTransition`] unless `NOT_LOADED` or `LOAD_ERROR`
    /// - [`LifecycleError::MissingLoader`] when no loader was configured (app becomes `BROKEN`)
    /// - [`LifecycleError::Execution`] when the loader or bootstrap fails (app becomes `LOAD_ERROR`)
    pub fn load(
        self: &Arc<Self>,
        switch: Option<&SwitchContext>,
    ) -> impl Future<Output = Result<(), LifecycleError>> + Send + 'static {
        let app = Arc::clone(self);
        let props = self.props(switch, None);
        self.in_flight
            .join(OperationKey::new(Operation::Load), async move {
                app.run_load(props).await
            })
    }

    /// Mount the app.
    ///
    /// A missing container still leaves the app `MOUNTED`; the
    /// [`LifecycleError::ContainerNotFound`] is returned so the caller can
    /// finish later through [`App::wait_for_child_container`].
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::InvalidStateTransition`] unless `NOT_MOUNTED`
    /// - [`LifecycleError::ContainerNotFound`] as described above
    /// - [`LifecycleError::Execution`] when the mount function fails (app becomes `BROKEN`)
    pub fn mount(
        self: &Arc<Self>,
        switch: Option<&SwitchContext>,
        route: Option<&MatchedRoute>,
    ) -> impl Future<Output = Result<(), LifecycleError>> + Send + 'static {
        let app = Arc::clone(self);
        let props = self.props(switch, route);
        self.in_flight
            .join(OperationKey::new(Operation::Mount), async move {
                app.run_mount(props).await
            })
    }

    /// Unmount the app after settling every parcel.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::InvalidStateTransition`] unless `MOUNTED`
    /// - the first parcel failure, or [`LifecycleError::Execution`] when the
    ///   unmount function fails (app becomes `BROKEN` in both cases)
    pub fn unmount(
        self: &Arc<Self>,
        switch: Option<&SwitchContext>,
        route: Option<&MatchedRoute>,
    ) -> impl Future<Output = Result<(), LifecycleError>> + Send + 'static {
        let app = Arc::clone(self);
        let props = self.props(switch, route);
        self.in_flight
            .join(OperationKey::new(Operation::Unmount), async move {
                app.run_unmount(props).await
            })
    }

    /// Wait until `container` inside this mounted app is ready.
    ///
    /// Not being mounted is logged and returns `Ok(())`. Without a container
    /// controller the host's [`ContainerWaitHook`] is asked instead.
    ///
    /// # Errors
    ///
    /// Failures of the controller or the fallback hook.
    pub fn wait_for_child_container(
        self: &Arc<Self>,
        container: &str,
        switch: Option<&SwitchContext>,
    ) -> impl Future<Output = Result<(), LifecycleError>> + Send + 'static {
        let app = Arc::clone(self);
        let props = self.props(switch, None);
        let name = container.to_string();
        self.in_flight.join(
            OperationKey::scoped(Operation::WaitForChildContainer, container),
            async move { app.run_wait_for_child_container(name, props).await },
        )
    }

    /// Load if needed, then mount.
    ///
    /// Mount failures are logged and the app is put back to `NOT_MOUNTED` so
    /// a later call can retry. That includes an app left `BROKEN` by an
    /// earlier mount. A missing container leaves the app `MOUNTED`; an app
    /// that is already mounting or mounted is left alone.
    ///
    /// # Errors
    ///
    /// Load failures only.
    pub async fn load_and_mount(self: &Arc<Self>) -> Result<(), LifecycleError> {
        if !self.is_loaded() {
            self.load(None).await?;
        }

        match self.mount(None, None).await {
            Ok(()) => {}
            Err(err) if err.is_container_not_found() => {
                warn!(app = %self.name, error = %err, "App mounted without its container");
            }
            Err(err) if err.is_invalid_transition() && self.status() != AppStatus::Broken => {
                debug!(app = %self.name, error = %err, "Skipping mount");
            }
            Err(err) => {
                error!(app = %self.name, error = %err, "Mount failed, app can be mounted again");
                self.set_status(AppStatus::NotMounted);
            }
        }
        Ok(())
    }

    /// Register a parcel owned by this app.
    ///
    /// A name that is already registered returns the existing app unchanged.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::RegistryUnavailable`] when the registry was dropped.
    pub fn register_parcel(self: &Arc<Self>, config: AppConfig) -> Result<Arc<App>, LifecycleError> {
        let inner = self
            .registry
            .upgrade()
            .ok_or_else(|| LifecycleError::RegistryUnavailable {
                app: self.name.clone(),
            })?;
        let registry = AppRegistry::from_inner(inner);

        let name = config.name.clone();
        match registry.insert_parcel(config) {
            Ok(parcel) => {
                debug!(app = %self.name, parcel = %name, "Parcel registered");
                self.parcels.lock().push(Arc::clone(&parcel));
                Ok(parcel)
            }
            Err(RegistryError::DuplicateName { .. }) => {
                warn!(app = %self.name, parcel = %name, "Parcel has been registered");
                registry.get(name.as_str()).map_err(|_| LifecycleError::RegistryUnavailable {
                    app: self.name.clone(),
                })
            }
            Err(RegistryError::NotFound { .. }) => Err(LifecycleError::RegistryUnavailable {
                app: self.name.clone(),
            }),
        }
    }

    async fn run_load(&self, props: AppProps) -> Outcome {
        let status = self.status();
        if !status.can_load() {
            return Err(self.invalid(Operation::Load, status));
        }

        let Some(load) = self.loader.clone() else {
            self.set_status(AppStatus::Broken);
            return Err(LifecycleError::MissingLoader {
                app: self.name.clone(),
            });
        };

        self.set_status(AppStatus::LoadingSourceCode);
        let lifecycles = match load(props.clone()).await {
            Ok(lifecycles) => lifecycles,
            Err(err) => {
                self.set_status(AppStatus::LoadError);
                return Err(self.hook_failure(Operation::Load, err));
            }
        };

        if let Some(bootstrap) = lifecycles.bootstrap.clone() {
            if let Err(err) = bootstrap(props).await {
                self.set_status(AppStatus::LoadError);
                return Err(self.hook_failure(Operation::Load, err));
            }
        }

        if !lifecycles.has_mount() {
            warn!(app = %self.name, "App does not export a valid mount function");
        }
        if !lifecycles.has_unmount() {
            warn!(app = %self.name, "App does not export a valid unmount function");
        }

        {
            let mut cell = self.cell.lock();
            cell.lifecycles = lifecycles;
            cell.is_loaded = true;
        }
        self.set_status(AppStatus::NotMounted);
        Ok(())
    }

    async fn run_mount(&self, props: AppProps) -> Outcome {
        let status = self.status();
        if !status.can_mount() {
            return Err(self.invalid(Operation::Mount, status));
        }

        let mount = self.cell.lock().lifecycles.mount.clone();
        let Some(mount) = mount else {
            self.set_status(AppStatus::Mounted);
            return Ok(());
        };

        self.set_status(AppStatus::Mounting);
        match mount(props).await {
            Ok(result) => {
                self.cell.lock().container_controller = result.container_controller;
                self.set_status(AppStatus::Mounted);
                Ok(())
            }
            Err(err) => {
                let err = self.hook_failure(Operation::Mount, err);
                if err.is_container_not_found() {
                    self.set_status(AppStatus::Mounted);
                } else {
                    self.set_status(AppStatus::Broken);
                }
                Err(err)
            }
        }
    }

    async fn run_unmount(&self, props: AppProps) -> Outcome {
        let status = self.status();
        if !status.can_unmount() {
            return Err(self.invalid(Operation::Unmount, status));
        }

        self.set_status(AppStatus::Unmounting);

        let parcels = self.parcels();
        let settled = join_all(parcels.iter().map(|parcel| parcel.settle_and_unmount(None))).await;
        if let Some(err) = settled.into_iter().find_map(Result::err) {
            error!(app = %self.name, error = %err, "Parcel failed to unmount");
            self.set_status(AppStatus::Broken);
            return Err(err);
        }

        let unmount = self.cell.lock().lifecycles.unmount.clone();
        let Some(unmount) = unmount else {
            self.cell.lock().container_controller = None;
            self.set_status(AppStatus::NotMounted);
            return Ok(());
        };

        match unmount(props).await {
            Ok(()) => {
                self.cell.lock().container_controller = None;
                self.set_status(AppStatus::NotMounted);
                Ok(())
            }
            Err(err) => {
                self.set_status(AppStatus::Broken);
                Err(self.hook_failure(Operation::Unmount, err))
            }
        }
    }

    async fn run_wait_for_child_container(&self, container: String, props: AppProps) -> Outcome {
        let status = self.status();
        if status != AppStatus::Mounted {
            error!(
                app = %self.name,
                %status,
                container = %container,
                "Can not wait for child container of an app that is not mounted"
            );
            return Ok(());
        }

        let controller = self.cell.lock().container_controller.clone();
        let waited = match controller {
            Some(controller) => controller.wait(&container, &props).await,
            None => {
                warn!(
                    app = %self.name,
                    container = %container,
                    "No container controller, mounting child apps may fail"
                );
                self.container_wait
                    .wait_for_child_container(ContainerWaitRequest {
                        container_name: container,
                        app_props: props,
                    })
                    .await
            }
        };
        waited.map_err(|err| self.hook_failure(Operation::WaitForChildContainer, err))
    }

    /// Drive the app to a terminal state and unmount it if it got mounted.
    ///
    /// A running mount is awaited first, a running unmount is joined.
    pub(crate) fn settle_and_unmount(
        self: &Arc<Self>,
        switch: Option<Arc<SwitchContext>>,
    ) -> BoxFuture<'static, Outcome> {
        let app = Arc::clone(self);
        async move {
            let switch = switch.as_deref();
            match app.status() {
                AppStatus::Mounting => match app.mount(switch, None).await {
                    Err(err) if !err.is_container_not_found() => return Err(err),
                    _ => {}
                },
                AppStatus::Unmounting => return app.unmount(switch, None).await,
                _ => {}
            }

            if app.status() == AppStatus::Mounted {
                app.unmount(switch, None).await?;
            }
            Ok(())
        }
        .boxed()
    }

    fn set_status(&self, status: AppStatus) {
        let previous = std::mem::replace(&mut self.cell.lock().status, status);
        debug!(app = %self.name, from = %previous, to = %status, "App status changed");
    }

    fn invalid(&self, operation: Operation, status: AppStatus) -> LifecycleError {
        LifecycleError::InvalidStateTransition {
            app: self.name.clone(),
            operation,
            status,
        }
    }

    fn hook_failure(&self, operation: Operation, err: HookError) -> LifecycleError {
        let cause = match err {
            HookError::ContainerNotFound { container }
                if matches!(
                    operation,
                    Operation::Mount | Operation::WaitForChildContainer
                ) =>
            {
                return LifecycleError::ContainerNotFound {
                    app: self.name.clone(),
                    container,
                };
            }
            HookError::Failed(cause) => cause,
            other => anyhow::Error::new(other),
        };
        LifecycleError::Execution {
            app: self.name.clone(),
            operation,
            cause: Arc::new(cause),
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("status", &self.status())
            .field("parcels", &self.parcels.lock().len())
            .finish_non_exhaustive()
    }
}
