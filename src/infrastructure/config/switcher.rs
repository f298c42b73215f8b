//! Switcher behavior settings.

use serde::Deserialize;

/// Settings applied to the host's app switcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SwitcherConfig {
    /// Stop a switch between batches once a newer switch has started.
    pub abandon_superseded: bool,
    /// Wait for parent containers before mounting nested apps.
    pub wait_for_child_containers: bool,
}

impl Default for SwitcherConfig {
    fn default() -> Self {
        Self {
            abandon_superseded: true,
            wait_for_child_containers: true,
        }
    }
}
