//! Application status and the operations that move it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an application.
///
/// Exactly one status holds at any instant. Transitions are driven only by
/// the [`Operation`]s of the owning app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppStatus {
    /// Registered, source not loaded yet.
    #[default]
    NotLoaded,
    /// Loader is running.
    LoadingSourceCode,
    /// Loaded and ready to mount.
    NotMounted,
    /// Mount function is running.
    Mounting,
    /// Mounted (possibly soft-mounted after a missing container).
    Mounted,
    /// Unmount function is running.
    Unmounting,
    /// Loader failed; a later load may retry.
    LoadError,
    /// Mount or unmount failed, or the app can never load.
    Broken,
}

impl AppStatus {
    /// Statuses from which `load` may start.
    #[must_use]
    pub fn can_load(self) -> bool {
        matches!(self, Self::NotLoaded | Self::LoadError)
    }

    /// Status from which `mount` may start.
    #[must_use]
    pub fn can_mount(self) -> bool {
        self == Self::NotMounted
    }

    /// Status from which `unmount` may start.
    #[must_use]
    pub fn can_unmount(self) -> bool {
        self == Self::Mounted
    }

    /// True while an operation body is running.
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::LoadingSourceCode | Self::Mounting | Self::Unmounting
        )
    }

    /// Wire name, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotLoaded => "NOT_LOADED",
            Self::LoadingSourceCode => "LOADING_SOURCE_CODE",
            Self::NotMounted => "NOT_MOUNTED",
            Self::Mounting => "MOUNTING",
            Self::Mounted => "MOUNTED",
            Self::Unmounting => "UNMOUNTING",
            Self::LoadError => "LOAD_ERROR",
            Self::Broken => "BROKEN",
        }
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status-mutating operations of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Load,
    Mount,
    Unmount,
    WaitForChildContainer,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Mount => "mount",
            Self::Unmount => "unmount",
            Self::WaitForChildContainer => "wait for child container of",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_allowed_only_before_success() {
        assert!(AppStatus::NotLoaded.can_load());
        assert!(AppStatus::LoadError.can_load());
        assert!(!AppStatus::LoadingSourceCode.can_load());
        assert!(!AppStatus::NotMounted.can_load());
        assert!(!AppStatus::Broken.can_load());
    }

    #[test]
    fn mount_and_unmount_preconditions() {
        assert!(AppStatus::NotMounted.can_mount());
        assert!(!AppStatus::Mounted.can_mount());
        assert!(AppStatus::Mounted.can_unmount());
        assert!(!AppStatus::NotMounted.can_unmount());
        assert!(!AppStatus::Unmounting.can_unmount());
    }

    #[test]
    fn status_display_matches_serde() {
        for status in [
            AppStatus::NotLoaded,
            AppStatus::LoadingSourceCode,
            AppStatus::Mounted,
            AppStatus::Broken,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn default_status_is_not_loaded() {
        assert_eq!(AppStatus::default(), AppStatus::NotLoaded);
        assert!(!AppStatus::default().is_transient());
        assert!(AppStatus::Mounting.is_transient());
    }
}
