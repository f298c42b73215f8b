//! Name-keyed application registry.
//!
//! The registry constructs every [`App`] and is the only place the
//! name-to-app map is written. Entries are insert-only.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::application::app::{App, AppConfig, AppDependencies};
use crate::domain::{AppName, AppSnapshot};
use crate::error::RegistryError;
use crate::port::{ContainerWaitHook, RerouteTrigger, Router};

pub(crate) struct RegistryInner {
    apps: DashMap<AppName, Arc<App>>,
    order: Mutex<Vec<AppName>>,
    router: Arc<dyn Router>,
    container_wait: Arc<dyn ContainerWaitHook>,
}

/// Registry of every app known to the host, top-level apps and parcels alike.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone)]
pub struct AppRegistry {
    inner: Arc<RegistryInner>,
}

impl AppRegistry {
    /// Create an empty registry wired to the host's router and container
    /// fallback.
    #[must_use]
    pub fn new(router: Arc<dyn Router>, container_wait: Arc<dyn ContainerWaitHook>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                apps: DashMap::new(),
                order: Mutex::new(Vec::new()),
                router,
                container_wait,
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<RegistryInner>) -> Self {
        Self { inner }
    }

    /// Register a top-level app, hand its routes to the router and ask for a
    /// reroute.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] when the name is taken; nothing is
    /// changed in that case.
    pub fn register(&self, config: AppConfig) -> Result<Arc<App>, RegistryError> {
        let app = self.insert(config, true)?;
        self.inner
            .router
            .reroute(RerouteTrigger::Registration(vec![app.name().clone()]));
        Ok(app)
    }

    /// Register several top-level apps, then ask for a single reroute.
    ///
    /// # Errors
    ///
    /// Stops at the first duplicate name. Apps registered before it stay
    /// registered and no reroute is requested.
    pub fn register_many<I>(&self, configs: I) -> Result<Vec<Arc<App>>, RegistryError>
    where
        I: IntoIterator<Item = AppConfig>,
    {
        let apps = configs
            .into_iter()
            .map(|config| self.insert(config, true))
            .collect::<Result<Vec<_>, _>>()?;

        let names = apps.iter().map(|app| app.name().clone()).collect();
        self.inner.router.reroute(RerouteTrigger::Registration(names));
        Ok(apps)
    }

    /// Register an app that lives outside routing and has no parent.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] when the name is taken.
    pub fn register_root_parcel(&self, config: AppConfig) -> Result<Arc<App>, RegistryError> {
        self.insert(config, false)
    }

    pub(crate) fn insert_parcel(&self, config: AppConfig) -> Result<Arc<App>, RegistryError> {
        self.insert(config, false)
    }

    /// Look up an app by name.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotFound`] when no app has that name.
    pub fn get(&self, name: &str) -> Result<Arc<App>, RegistryError> {
        self.inner
            .apps
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RegistryError::NotFound {
                name: AppName::new(name),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.apps.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.apps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.apps.is_empty()
    }

    /// Every registered app in registration order.
    #[must_use]
    pub fn apps(&self) -> Vec<Arc<App>> {
        let order = self.inner.order.lock().clone();
        order
            .iter()
            .filter_map(|name| self.inner.apps.get(name).map(|e| Arc::clone(e.value())))
            .collect()
    }

    /// Diagnostic view of every app in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<AppSnapshot> {
        self.apps().iter().map(|app| app.snapshot()).collect()
    }

    fn insert(&self, config: AppConfig, with_routes: bool) -> Result<Arc<App>, RegistryError> {
        let name = config.name.clone();
        let routes = if with_routes {
            config.routes.clone()
        } else {
            Vec::new()
        };

        let app = match self.inner.apps.entry(name.clone()) {
            Entry::Occupied(_) => return Err(RegistryError::DuplicateName { name }),
            Entry::Vacant(slot) => {
                let app = Arc::new(App::new(
                    config,
                    AppDependencies {
                        registry: Arc::downgrade(&self.inner),
                        container_wait: Arc::clone(&self.inner.container_wait),
                    },
                ));
                slot.insert(Arc::clone(&app));
                app
            }
        };
        self.inner.order.lock().push(name.clone());

        if !routes.is_empty() {
            debug!(app = %name, routes = routes.len(), "Adding routes");
            self.inner.router.add_routes(&routes, &name);
        }
        info!(app = %name, "App registered");
        Ok(app)
    }
}

impl std::fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRegistry")
            .field("apps", &self.inner.order.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RouteConfig;
    use crate::port::{LifeCycles, NoopContainerWait, NoopRouter};

    fn registry() -> AppRegistry {
        AppRegistry::new(Arc::new(NoopRouter), Arc::new(NoopContainerWait))
    }

    fn config(name: &str) -> AppConfig {
        AppConfig::new(name).with_loader(|_| async { Ok(LifeCycles::new()) })
    }

    #[test]
    fn test_registry_new() {
        let registry = registry();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_register_and_get() {
        let registry = registry();
        let app = registry
            .register(config("orders").with_route(RouteConfig::new("/orders")))
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.contains("orders"));
        assert!(Arc::ptr_eq(&app, &registry.get("orders").unwrap()));
    }

    #[test]
    fn test_registry_rejects_duplicate() {
        let registry = registry();
        let first = registry.register(config("orders")).unwrap();

        let err = registry.register(config("orders")).unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateName {
                name: AppName::new("orders")
            }
        );
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&first, &registry.get("orders").unwrap()));
    }

    #[test]
    fn test_registry_get_missing() {
        let err = registry().get("ghost").unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[test]
    fn test_registry_keeps_registration_order() {
        let registry = registry();
        registry
            .register_many(vec![config("c"), config("a"), config("b")])
            .unwrap();
        registry.register_root_parcel(config("toast")).unwrap();

        let names: Vec<_> = registry
            .snapshot()
            .into_iter()
            .map(|snapshot| snapshot.name)
            .collect();
        assert_eq!(names, vec!["c", "a", "b", "toast"]);
    }
}
