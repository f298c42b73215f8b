//! Registration input for an application.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::{AppName, RouteConfig};
use crate::port::{loader, AppProps, HookError, LifeCycles, LoadFn};

/// Computes per-app properties from the app's name.
pub type PropsFn = Arc<dyn Fn(&AppName) -> Map<String, Value> + Send + Sync>;

/// Properties handed to lifecycle functions.
#[derive(Clone)]
pub enum AppConfigProps {
    /// The same object for every call.
    Static(Map<String, Value>),
    /// Computed from the app name on every call.
    Dynamic(PropsFn),
}

impl AppConfigProps {
    pub(crate) fn resolve(&self, name: &AppName) -> Map<String, Value> {
        match self {
            Self::Static(props) => props.clone(),
            Self::Dynamic(f) => f(name),
        }
    }
}

impl Default for AppConfigProps {
    fn default() -> Self {
        Self::Static(Map::new())
    }
}

impl fmt::Debug for AppConfigProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(props) => f.debug_tuple("Static").field(props).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Everything needed to register an app.
#[derive(Clone)]
pub struct AppConfig {
    pub name: AppName,
    /// Routes handed to the router for top-level apps. Ignored for parcels.
    pub routes: Vec<RouteConfig>,
    pub props: AppConfigProps,
    /// Without a loader the app can never load and ends up `Broken`.
    pub loader: Option<LoadFn>,
}

impl AppConfig {
    /// Config with a name and nothing else.
    pub fn new(name: impl Into<AppName>) -> Self {
        Self {
            name: name.into(),
            routes: Vec::new(),
            props: AppConfigProps::default(),
            loader: None,
        }
    }

    /// Set the loader from an async closure.
    #[must_use]
    pub fn with_loader<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(AppProps) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<LifeCycles, HookError>> + Send + 'static,
    {
        self.loader = Some(loader(f));
        self
    }

    /// Set an already wrapped loader.
    #[must_use]
    pub fn with_load_fn(mut self, load: LoadFn) -> Self {
        self.loader = Some(load);
        self
    }

    #[must_use]
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    #[must_use]
    pub fn with_props(mut self, props: Map<String, Value>) -> Self {
        self.props = AppConfigProps::Static(props);
        self
    }

    #[must_use]
    pub fn with_props_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&AppName) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.props = AppConfigProps::Dynamic(Arc::new(f));
        self
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("name", &self.name)
            .field("routes", &self.routes)
            .field("props", &self.props)
            .field("loader", &self.loader.is_some())
            .finish()
    }
}
