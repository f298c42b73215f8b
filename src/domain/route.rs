//! Route declarations and match results.
//!
//! Route matching itself happens outside this crate: applications hand
//! [`RouteConfig`]s to the router and the router hands back a
//! [`MatchedResult`] per navigation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::AppName;

/// A route declared by an application at registration time.
///
/// The router owns matching; this core only hands declarations over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Path pattern understood by the router.
    pub path: String,
    /// Container in the parent route's app that this route renders into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    /// Nested routes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteConfig>,
}

impl RouteConfig {
    /// Create a route for `path` without slot or children.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the parent container this route renders into.
    #[must_use]
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    /// Add a nested route.
    #[must_use]
    pub fn with_child(mut self, child: RouteConfig) -> Self {
        self.children.push(child);
        self
    }
}

/// One matched route produced by the external matcher for a navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRoute {
    /// Path pattern of the route that matched.
    pub path: String,
    /// Parameters extracted by the matcher.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    /// Apps that must be active for this route.
    #[serde(default)]
    pub apps: Vec<AppName>,
    /// Container in the parent route's app that these apps render into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    /// Routes matched below this one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MatchedRoute>,
}

impl MatchedRoute {
    /// Create a matched route for `path` activating `apps`.
    pub fn new<I, N>(path: impl Into<String>, apps: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<AppName>,
    {
        Self {
            path: path.into(),
            apps: apps.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Set the parent container these apps render into.
    #[must_use]
    pub fn with_slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    /// Add an extracted parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Add a nested matched route.
    #[must_use]
    pub fn with_child(mut self, child: MatchedRoute) -> Self {
        self.children.push(child);
        self
    }

    /// Copy of this route without its nested children.
    ///
    /// This is what a lifecycle function receives as its route.
    #[must_use]
    pub fn without_children(&self) -> Self {
        Self {
            path: self.path.clone(),
            params: self.params.clone(),
            apps: self.apps.clone(),
            slot: self.slot.clone(),
            children: Vec::new(),
        }
    }
}

/// Ordered match result for one navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchedResult {
    routes: Vec<MatchedRoute>,
}

impl MatchedResult {
    /// Wrap the matcher's top-level routes.
    #[must_use]
    pub fn new(routes: Vec<MatchedRoute>) -> Self {
        Self { routes }
    }

    /// Top-level matched routes in order.
    #[must_use]
    pub fn routes(&self) -> &[MatchedRoute] {
        &self.routes
    }

    /// True when nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Every app name mentioned anywhere in the result, first occurrence order.
    #[must_use]
    pub fn app_names(&self) -> Vec<AppName> {
        let mut names = Vec::new();
        let mut stack: Vec<&MatchedRoute> = self.routes.iter().rev().collect();
        while let Some(route) = stack.pop() {
            for app in &route.apps {
                if !names.contains(app) {
                    names.push(app.clone());
                }
            }
            stack.extend(route.children.iter().rev());
        }
        names
    }
}

impl From<Vec<MatchedRoute>> for MatchedResult {
    fn from(routes: Vec<MatchedRoute>) -> Self {
        Self::new(routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_names_walks_depth_first_without_duplicates() {
        let result = MatchedResult::new(vec![
            MatchedRoute::new("/", ["shell"]).with_child(
                MatchedRoute::new("/orders", ["orders", "shell"]).with_slot("main"),
            ),
            MatchedRoute::new("/help", ["help"]),
        ]);

        assert_eq!(result.app_names(), vec!["shell", "orders", "help"]);
    }

    #[test]
    fn without_children_drops_nested_routes_only() {
        let route = MatchedRoute::new("/", ["shell"])
            .with_param("id", "7")
            .with_child(MatchedRoute::new("/a", ["a"]));
        let flat = route.without_children();
        assert!(flat.children.is_empty());
        assert_eq!(flat.params.get("id").map(String::as_str), Some("7"));
        assert_eq!(flat.apps, vec![AppName::new("shell")]);
    }

    #[test]
    fn matched_result_deserializes_from_toml_array() {
        #[derive(Deserialize)]
        struct Navigation {
            routes: MatchedResult,
        }

        let nav: Navigation = toml::from_str(
            r#"
[[routes]]
path = "/"
apps = ["shell"]

[[routes.children]]
path = "/orders"
slot = "main"
apps = ["orders"]
"#,
        )
        .unwrap();

        assert_eq!(nav.routes.routes().len(), 1);
        assert_eq!(
            nav.routes.routes()[0].children[0].slot.as_deref(),
            Some("main")
        );
    }
}
