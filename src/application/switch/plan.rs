//! Breadth-first grouping of the apps a match result activates.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::application::app::App;
use crate::application::registry::AppRegistry;
use crate::domain::{AppName, MatchedResult, MatchedRoute};

/// One app scheduled for activation.
#[derive(Debug, Clone)]
pub struct PlannedApp {
    pub app: Arc<App>,
    /// Route the app was matched by, without nested children.
    pub route: Option<MatchedRoute>,
    /// App that owns the container this app renders into.
    pub parent: Option<Arc<App>>,
    /// Container slot inside `parent`.
    pub container: Option<String>,
}

impl PlannedApp {
    #[must_use]
    pub fn new(app: Arc<App>) -> Self {
        Self {
            app,
            route: None,
            parent: None,
            container: None,
        }
    }

    #[must_use]
    pub fn with_route(mut self, route: MatchedRoute) -> Self {
        self.route = Some(route.without_children());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: Arc<App>, container: impl Into<String>) -> Self {
        self.parent = Some(parent);
        self.container = Some(container.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &AppName {
        self.app.name()
    }
}

/// Ordered batches of apps. Apps in one batch are activated concurrently;
/// batch `i + 1` starts only after batch `i` has settled.
#[derive(Debug, Clone, Default)]
pub struct GroupPlan {
    batches: Vec<Vec<PlannedApp>>,
}

impl GroupPlan {
    /// Plan from explicit batches. Empty batches are dropped.
    #[must_use]
    pub fn new(batches: Vec<Vec<PlannedApp>>) -> Self {
        Self {
            batches: batches.into_iter().filter(|b| !b.is_empty()).collect(),
        }
    }

    /// Group the apps of `matched` by route depth.
    ///
    /// An app appears once, at the shallowest depth it was matched. Names
    /// the registry does not know are returned separately.
    #[must_use]
    pub fn from_matched(matched: &MatchedResult, registry: &AppRegistry) -> (Self, Vec<AppName>) {
        let mut batches = Vec::new();
        let mut unknown: Vec<AppName> = Vec::new();
        let mut seen = HashSet::new();

        let mut level: Vec<(&MatchedRoute, Option<Arc<App>>)> =
            matched.routes().iter().map(|route| (route, None)).collect();

        while !level.is_empty() {
            let mut batch = Vec::new();
            let mut next = Vec::new();

            for (route, parent) in level {
                let mut owner = None;
                for name in &route.apps {
                    let Ok(app) = registry.get(name.as_str()) else {
                        if !unknown.contains(name) {
                            warn!(app = %name, path = %route.path, "Matched app is not registered");
                            unknown.push(name.clone());
                        }
                        continue;
                    };
                    if owner.is_none() {
                        owner = Some(Arc::clone(&app));
                    }
                    if seen.insert(name.clone()) {
                        batch.push(PlannedApp {
                            app,
                            route: Some(route.without_children()),
                            parent: parent.clone(),
                            container: route.slot.clone(),
                        });
                    }
                }

                let child_parent = owner.or(parent);
                next.extend(
                    route
                        .children
                        .iter()
                        .map(|child| (child, child_parent.clone())),
                );
            }

            if !batch.is_empty() {
                batches.push(batch);
            }
            level = next;
        }

        (Self { batches }, unknown)
    }

    #[must_use]
    pub fn batches(&self) -> &[Vec<PlannedApp>] {
        &self.batches
    }

    #[must_use]
    pub fn batch(&self, index: usize) -> &[PlannedApp] {
        self.batches.get(index).map_or(&[], Vec::as_slice)
    }

    /// Number of batches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Every planned app in batch order.
    #[must_use]
    pub fn apps(&self) -> Vec<Arc<App>> {
        self.batches
            .iter()
            .flatten()
            .map(|planned| Arc::clone(&planned.app))
            .collect()
    }

    /// App names per batch.
    #[must_use]
    pub fn names(&self) -> Vec<Vec<AppName>> {
        self.batches
            .iter()
            .map(|batch| batch.iter().map(|p| p.name().clone()).collect())
            .collect()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.batches.iter().flatten().any(|p| p.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::app::AppConfig;
    use crate::port::{LifeCycles, NoopContainerWait, NoopRouter};

    fn registry(names: &[&str]) -> AppRegistry {
        let registry = AppRegistry::new(Arc::new(NoopRouter), Arc::new(NoopContainerWait));
        for name in names {
            registry
                .register(AppConfig::new(*name).with_loader(|_| async { Ok(LifeCycles::new()) }))
                .unwrap();
        }
        registry
    }

    #[test]
    fn groups_by_depth() {
        let registry = registry(&["shell", "nav", "orders", "detail"]);
        let matched = MatchedResult::new(vec![
            MatchedRoute::new("/", ["shell", "nav"]).with_child(
                MatchedRoute::new("/orders", ["orders"])
                    .with_slot("main")
                    .with_child(MatchedRoute::new("/orders/:id", ["detail"]).with_slot("panel")),
            ),
        ]);

        let (plan, unknown) = GroupPlan::from_matched(&matched, &registry);

        assert!(unknown.is_empty());
        assert_eq!(
            plan.names(),
            vec![vec!["shell", "nav"], vec!["orders"], vec!["detail"]]
        );
        let orders = &plan.batch(1)[0];
        assert_eq!(orders.parent.as_ref().unwrap().name(), "shell");
        assert_eq!(orders.container.as_deref(), Some("main"));
        let detail = &plan.batch(2)[0];
        assert_eq!(detail.parent.as_ref().unwrap().name(), "orders");
        assert!(detail.route.as_ref().unwrap().children.is_empty());
    }

    #[test]
    fn keeps_shallowest_occurrence() {
        let registry = registry(&["shell", "orders"]);
        let matched = MatchedResult::new(vec![MatchedRoute::new("/", ["shell"])
            .with_child(MatchedRoute::new("/orders", ["orders", "shell"]))]);

        let (plan, _) = GroupPlan::from_matched(&matched, &registry);

        assert_eq!(plan.names(), vec![vec!["shell"], vec!["orders"]]);
    }

    #[test]
    fn reports_unknown_names_once() {
        let registry = registry(&["shell"]);
        let matched = MatchedResult::new(vec![
            MatchedRoute::new("/", ["shell", "ghost"]),
            MatchedRoute::new("/other", ["ghost"]),
        ]);

        let (plan, unknown) = GroupPlan::from_matched(&matched, &registry);

        assert_eq!(plan.names(), vec![vec!["shell"]]);
        assert_eq!(unknown, vec!["ghost"]);
    }

    #[test]
    fn empty_match_has_no_batches() {
        let (plan, unknown) = GroupPlan::from_matched(&MatchedResult::default(), &registry(&[]));
        assert!(plan.is_empty());
        assert!(unknown.is_empty());
        assert!(plan.batch(0).is_empty());
    }
}
