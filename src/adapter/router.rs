//! In-memory router.

use parking_lot::Mutex;
use tracing::debug;

use crate::domain::{AppName, RouteConfig};
use crate::port::{RerouteTrigger, Router};

/// Router that records route declarations and reroute requests.
///
/// Matching is left to the caller, who passes match results to the host
/// directly. The CLI and tests use this to observe what the registry
/// contributed.
#[derive(Debug, Default)]
pub struct RecordingRouter {
    routes: Mutex<Vec<(AppName, RouteConfig)>>,
    reroutes: Mutex<Vec<RerouteTrigger>>,
}

impl RecordingRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every declared route with its owner, in declaration order.
    #[must_use]
    pub fn routes(&self) -> Vec<(AppName, RouteConfig)> {
        self.routes.lock().clone()
    }

    /// Routes declared by `owner`.
    #[must_use]
    pub fn routes_of(&self, owner: &str) -> Vec<RouteConfig> {
        self.routes
            .lock()
            .iter()
            .filter(|(name, _)| name == owner)
            .map(|(_, route)| route.clone())
            .collect()
    }

    #[must_use]
    pub fn reroutes(&self) -> Vec<RerouteTrigger> {
        self.reroutes.lock().clone()
    }

    #[must_use]
    pub fn reroute_count(&self) -> usize {
        self.reroutes.lock().len()
    }
}

impl Router for RecordingRouter {
    fn add_routes(&self, routes: &[RouteConfig], owner: &AppName) {
        debug!(app = %owner, routes = routes.len(), "Routes declared");
        self.routes
            .lock()
            .extend(routes.iter().cloned().map(|route| (owner.clone(), route)));
    }

    fn reroute(&self, trigger: RerouteTrigger) {
        debug!(?trigger, "Reroute requested");
        self.reroutes.lock().push(trigger);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::{AppConfig, AppRegistry};
    use crate::port::{LifeCycles, NoopContainerWait};

    fn config(name: &str) -> AppConfig {
        AppConfig::new(name).with_loader(|_| async { Ok(LifeCycles::new()) })
    }

    #[test]
    fn registration_declares_routes_and_reroutes_once() {
        let router = Arc::new(RecordingRouter::new());
        let registry = AppRegistry::new(router.clone(), Arc::new(NoopContainerWait));

        registry
            .register_many(vec![
                config("shell").with_route(RouteConfig::new("/")),
                config("orders").with_route(RouteConfig::new("/orders").with_slot("main")),
            ])
            .unwrap();

        assert_eq!(router.routes().len(), 2);
        assert_eq!(router.routes_of("orders")[0].slot.as_deref(), Some("main"));
        assert_eq!(
            router.reroutes(),
            vec![RerouteTrigger::Registration(vec![
                AppName::new("shell"),
                AppName::new("orders")
            ])]
        );
    }

    #[test]
    fn root_parcels_do_not_touch_router() {
        let router = Arc::new(RecordingRouter::new());
        let registry = AppRegistry::new(router.clone(), Arc::new(NoopContainerWait));

        registry
            .register_root_parcel(config("toast").with_route(RouteConfig::new("/toast")))
            .unwrap();

        assert!(router.routes().is_empty());
        assert_eq!(router.reroute_count(), 0);
    }
}
