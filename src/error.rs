use std::sync::Arc;

use thiserror::Error;

use crate::domain::{AppName, AppStatus, Operation};

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Registry errors.
///
/// `DuplicateName` is a configuration error: the registry is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate app name: \"{name}\"")]
    DuplicateName { name: AppName },

    #[error("can not find app by name \"{name}\"")]
    NotFound { name: AppName },
}

/// Failures of an application lifecycle operation.
///
/// Outcomes are shared between every caller attached to the same in-flight
/// operation, so this type is `Clone` and keeps external causes behind an `Arc`.
#[derive(Error, Debug, Clone)]
pub enum LifecycleError {
    /// The app was registered without a loader function.
    #[error("can not find a loader on app \"{app}\"")]
    MissingLoader { app: AppName },

    /// The operation is not legal from the app's current status.
    #[error("can not {operation} app \"{app}\" with status \"{status}\"")]
    InvalidStateTransition {
        app: AppName,
        operation: Operation,
        status: AppStatus,
    },

    /// Mount could not find its container. The app still settles to `Mounted`.
    #[error("container \"{container}\" of app \"{app}\" was not found")]
    ContainerNotFound { app: AppName, container: String },

    /// An externally supplied lifecycle function failed.
    #[error("{operation} of app \"{app}\" failed: {cause:#}")]
    Execution {
        app: AppName,
        operation: Operation,
        cause: Arc<anyhow::Error>,
    },

    /// The registry that created this app has been dropped.
    #[error("registry of app \"{app}\" is no longer available")]
    RegistryUnavailable { app: AppName },
}

impl LifecycleError {
    /// True for errors caused by how the app was configured rather than by
    /// what its lifecycle functions did.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingLoader { .. } | Self::RegistryUnavailable { .. }
        )
    }

    /// True for the recoverable container-not-found signal.
    #[must_use]
    pub fn is_container_not_found(&self) -> bool {
        matches!(self, Self::ContainerNotFound { .. })
    }

    /// True when the operation was rejected before running.
    #[must_use]
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidStateTransition { .. })
    }

    /// Name of the app the error belongs to.
    #[must_use]
    pub fn app(&self) -> &AppName {
        match self {
            Self::MissingLoader { app }
            | Self::InvalidStateTransition { app, .. }
            | Self::ContainerNotFound { app, .. }
            | Self::Execution { app, .. }
            | Self::RegistryUnavailable { app } => app,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for configuration errors of any layer.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Config(_) | Self::Registry(RegistryError::DuplicateName { .. }) => true,
            Self::Lifecycle(err) => err.is_configuration(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_shows_cause_chain() {
        let cause = anyhow::anyhow!("socket closed").context("fetch bundle");
        let err = LifecycleError::Execution {
            app: AppName::new("orders"),
            operation: Operation::Load,
            cause: Arc::new(cause),
        };
        let message = err.to_string();
        assert!(message.contains("load of app \"orders\" failed"));
        assert!(message.contains("fetch bundle"));
        assert!(message.contains("socket closed"));
    }

    #[test]
    fn duplicate_name_is_configuration_error() {
        let err: Error = RegistryError::DuplicateName {
            name: AppName::new("shell"),
        }
        .into();
        assert!(err.is_configuration());

        let err: Error = RegistryError::NotFound {
            name: AppName::new("shell"),
        }
        .into();
        assert!(!err.is_configuration());
    }

    #[test]
    fn invalid_transition_message_names_status() {
        let err = LifecycleError::InvalidStateTransition {
            app: AppName::new("shell"),
            operation: Operation::Unmount,
            status: AppStatus::NotMounted,
        };
        assert!(err.is_invalid_transition());
        assert_eq!(
            err.to_string(),
            "can not unmount app \"shell\" with status \"NOT_MOUNTED\""
        );
    }
}
