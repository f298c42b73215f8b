//! Diagnostic projection of an application.

use serde::Serialize;

use super::{AppName, AppStatus};

/// Externally inspectable view of an app.
///
/// Only these fields are exposed when an app is serialized for diagnostics;
/// loader, lifecycle functions and registry links stay private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppSnapshot {
    pub name: AppName,
    pub status: AppStatus,
    pub is_loaded: bool,
    pub has_mount: bool,
    pub has_unmount: bool,
    pub has_container_controller: bool,
    pub parcels: Vec<AppName>,
}
