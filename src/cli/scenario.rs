//! Simulation scenarios driven by the CLI.
//!
//! A scenario is a TOML file listing simulated apps and the navigations to
//! perform:
//!
//! ```toml
//! prefetch = ["orders"]
//!
//! [[apps]]
//! name = "shell"
//! containers = ["main"]
//!
//! [[apps]]
//! name = "orders"
//! mount_ms = 20
//!
//! [[navigations]]
//! label = "orders page"
//!
//! [[navigations.routes]]
//! path = "/"
//! apps = ["shell"]
//!
//! [[navigations.routes.children]]
//! path = "/orders"
//! apps = ["orders"]
//! slot = "main"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::adapter::simulated::SimulatedAppSpec;
use crate::domain::{AppName, MatchedResult, MatchedRoute};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Apps loaded before the first navigation.
    #[serde(default)]
    pub prefetch: Vec<AppName>,
    #[serde(default)]
    pub apps: Vec<SimulatedAppSpec>,
    #[serde(default)]
    pub navigations: Vec<Navigation>,
}

/// One navigation, given as the router's match result.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Navigation {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub routes: Vec<MatchedRoute>,
}

impl Navigation {
    #[must_use]
    pub fn matched(&self) -> MatchedResult {
        MatchedResult::new(self.routes.clone())
    }

    /// Label, or the top-level paths when no label was given.
    #[must_use]
    pub fn title(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            self.routes
                .iter()
                .map(|route| route.path.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        })
    }
}

impl Scenario {
    /// Parse a scenario from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, an app name repeats or no
    /// navigation is given.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    fn validate(&self) -> Result<()> {
        if self.navigations.is_empty() {
            return Err(ConfigError::MissingField {
                field: "navigations",
            }
            .into());
        }

        let mut names = HashSet::new();
        for app in &self.apps {
            if !names.insert(app.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "apps",
                    reason: format!("app \"{}\" is declared twice", app.name),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const SCENARIO: &str = r#"
prefetch = ["orders"]

[[apps]]
name = "shell"
containers = ["main"]

[[apps]]
name = "orders"
mount_ms = 20

[[navigations]]
label = "orders page"

[[navigations.routes]]
path = "/"
apps = ["shell"]

[[navigations.routes.children]]
path = "/orders"
apps = ["orders"]
slot = "main"

[[navigations]]
[[navigations.routes]]
path = "/"
apps = ["shell"]
"#;

    #[test]
    fn parses_nested_navigations() {
        let scenario = Scenario::parse_toml(SCENARIO).unwrap();

        assert_eq!(scenario.apps.len(), 2);
        assert_eq!(scenario.prefetch, vec!["orders"]);
        let first = &scenario.navigations[0];
        assert_eq!(first.title(), "orders page");
        assert_eq!(first.matched().app_names(), vec!["shell", "orders"]);
        assert_eq!(first.routes[0].children[0].slot.as_deref(), Some("main"));
        assert_eq!(scenario.navigations[1].title(), "/");
    }

    #[test]
    fn rejects_duplicate_apps() {
        let err = Scenario::parse_toml(
            "[[apps]]\nname = \"a\"\n[[apps]]\nname = \"a\"\n[[navigations]]\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "apps", .. })
        ));
    }

    #[test]
    fn requires_a_navigation() {
        let err = Scenario::parse_toml("[[apps]]\nname = \"a\"\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingField {
                field: "navigations"
            })
        ));
    }
}
