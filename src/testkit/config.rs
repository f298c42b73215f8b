//! Canonical test configurations.

use crate::infrastructure::config::{Config, LoggingConfig, SwitcherConfig};

/// Config with quiet logging and the given switcher settings.
pub fn config(switcher: SwitcherConfig) -> Config {
    Config {
        logging: LoggingConfig {
            level: "warn".into(),
            format: "pretty".into(),
        },
        switcher,
    }
}

/// Switcher that finishes every switch even when superseded.
pub fn never_abandon() -> SwitcherConfig {
    SwitcherConfig {
        abandon_superseded: false,
        ..SwitcherConfig::default()
    }
}
