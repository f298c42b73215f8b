//! Identifier types with proper encapsulation.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique application name - newtype for type safety.
///
/// Names are immutable once an app is created and are the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppName(String);

impl AppName {
    /// Create a new `AppName` from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AppName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AppName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Borrow<str> for AppName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AppName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AppName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for AppName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Identifier of a single switch (one navigation event).
///
/// Generated as UUID v4 so overlapping switches can be told apart in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchId(String);

impl SwitchId {
    /// Create a new `SwitchId` with a generated UUID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the switch ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SwitchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_new_and_as_str() {
        let name = AppName::new("orders");
        assert_eq!(name.as_str(), "orders");
        assert_eq!(name, "orders");
    }

    #[test]
    fn app_name_display() {
        let name = AppName::from("shell".to_string());
        assert_eq!(format!("{name}"), "shell");
    }

    #[test]
    fn app_name_serializes_as_plain_string() {
        let json = serde_json::to_string(&AppName::new("shell")).unwrap();
        assert_eq!(json, "\"shell\"");
    }

    #[test]
    fn switch_id_generates_unique_ids() {
        let a = SwitchId::new();
        let b = SwitchId::default();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
