//! Lifecycle port: the functions an application bundle hands back when loaded.
//!
//! A loader is an externally supplied async function. It returns
//! [`LifeCycles`] with optional `bootstrap`, `mount` and `unmount` functions,
//! which the application state machine invokes but never produces.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{AppName, MatchedRoute, SwitchId};

/// Failure reported by an externally supplied lifecycle function.
#[derive(Error, Debug)]
pub enum HookError {
    /// The container the app renders into does not exist (yet).
    ///
    /// Mount treats this as a soft success.
    #[error("container \"{container}\" not found")]
    ContainerNotFound { container: String },

    /// Any other failure.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl HookError {
    /// Signal a missing container.
    pub fn container_not_found(container: impl Into<String>) -> Self {
        Self::ContainerNotFound {
            container: container.into(),
        }
    }

    /// Build a plain failure from a message.
    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::Failed(anyhow::Error::msg(message))
    }
}

/// Future returned by every lifecycle function.
pub type HookFuture<T> = BoxFuture<'static, Result<T, HookError>>;

/// Loads an application and returns its lifecycle functions.
pub type LoadFn = Arc<dyn Fn(AppProps) -> HookFuture<LifeCycles> + Send + Sync>;

/// Runs once after a successful load.
pub type BootstrapFn = Arc<dyn Fn(AppProps) -> HookFuture<()> + Send + Sync>;

/// Mounts an application.
pub type MountFn = Arc<dyn Fn(AppProps) -> HookFuture<MountResult> + Send + Sync>;

/// Unmounts an application.
pub type UnmountFn = Arc<dyn Fn(AppProps) -> HookFuture<()> + Send + Sync>;

/// Wrap an async closure as a [`LoadFn`].
pub fn loader<F, Fut>(f: F) -> LoadFn
where
    F: Fn(AppProps) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<LifeCycles, HookError>> + Send + 'static,
{
    Arc::new(move |props| f(props).boxed())
}

/// Properties handed to every lifecycle function.
#[derive(Debug, Clone, Serialize)]
pub struct AppProps {
    /// Name of the app being driven.
    pub name: AppName,
    /// Static or per-app computed properties from the app's config.
    pub props: Map<String, Value>,
    /// Switch that triggered the call, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch_id: Option<SwitchId>,
    /// Route the app matched in that switch, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<MatchedRoute>,
}

impl AppProps {
    /// Look up a single configured property.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }
}

/// Handle returned by a successful mount that knows when a child container
/// inside the app is ready.
#[async_trait]
pub trait ContainerController: Send + Sync {
    /// Resolve once `container` exists inside the mounted app.
    async fn wait(&self, container: &str, props: &AppProps) -> Result<(), HookError>;
}

/// Result of a mount function.
#[derive(Clone, Default)]
pub struct MountResult {
    pub container_controller: Option<Arc<dyn ContainerController>>,
}

impl MountResult {
    /// Mount result carrying a container controller.
    pub fn with_controller(controller: Arc<dyn ContainerController>) -> Self {
        Self {
            container_controller: Some(controller),
        }
    }
}

impl fmt::Debug for MountResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountResult")
            .field("container_controller", &self.container_controller.is_some())
            .finish()
    }
}

/// Lifecycle functions returned by a loader. Each one is optional.
#[derive(Clone, Default)]
pub struct LifeCycles {
    pub(crate) bootstrap: Option<BootstrapFn>,
    pub(crate) mount: Option<MountFn>,
    pub(crate) unmount: Option<UnmountFn>,
}

impl LifeCycles {
    /// Empty set of lifecycle functions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bootstrap function.
    #[must_use]
    pub fn with_bootstrap<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(AppProps) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.bootstrap = Some(Arc::new(move |props| f(props).boxed()));
        self
    }

    /// Set the mount function.
    #[must_use]
    pub fn with_mount<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(AppProps) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MountResult, HookError>> + Send + 'static,
    {
        self.mount = Some(Arc::new(move |props| f(props).boxed()));
        self
    }

    /// Set the unmount function.
    #[must_use]
    pub fn with_unmount<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(AppProps) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.unmount = Some(Arc::new(move |props| f(props).boxed()));
        self
    }

    #[must_use]
    pub fn has_bootstrap(&self) -> bool {
        self.bootstrap.is_some()
    }

    #[must_use]
    pub fn has_mount(&self) -> bool {
        self.mount.is_some()
    }

    #[must_use]
    pub fn has_unmount(&self) -> bool {
        self.unmount.is_some()
    }
}

impl fmt::Debug for LifeCycles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifeCycles")
            .field("bootstrap", &self.has_bootstrap())
            .field("mount", &self.has_mount())
            .field("unmount", &self.has_unmount())
            .finish()
    }
}
