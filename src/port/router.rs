//! Router port.
//!
//! Route matching is owned by the host's router. This core only contributes
//! route declarations and asks for re-evaluation.

use crate::domain::{AppName, RouteConfig};

/// Why a re-evaluation of the active set is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RerouteTrigger {
    /// New top-level apps were registered.
    Registration(Vec<AppName>),
    /// The host started.
    Start,
}

/// External router capability.
pub trait Router: Send + Sync {
    /// Contribute `routes` owned by the app `owner`.
    fn add_routes(&self, routes: &[RouteConfig], owner: &AppName);

    /// Ask the router to match the current location again and switch.
    fn reroute(&self, trigger: RerouteTrigger);
}

/// Router that ignores everything. Useful for hosts that switch manually.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRouter;

impl Router for NoopRouter {
    fn add_routes(&self, _routes: &[RouteConfig], _owner: &AppName) {}

    fn reroute(&self, _trigger: RerouteTrigger) {}
}
