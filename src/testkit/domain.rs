//! Builders for domain primitives used across tests.

use crate::domain::{AppName, MatchedResult, MatchedRoute};

/// Matched route for `path` activating `apps`.
pub fn route(path: &str, apps: &[&str]) -> MatchedRoute {
    MatchedRoute::new(path, apps.iter().copied())
}

/// Match result of the given top-level routes.
pub fn matched(routes: Vec<MatchedRoute>) -> MatchedResult {
    MatchedResult::new(routes)
}

/// Match result with one top-level route per app, all at depth 0.
pub fn flat(apps: &[&str]) -> MatchedResult {
    MatchedResult::new(vec![route("/", apps)])
}

pub fn names(names: &[&str]) -> Vec<AppName> {
    names.iter().copied().map(AppName::from).collect()
}
