//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`apps`] - App configs with call counters, failures and gated mounts.
//! - [`domain`] - Builders for match results and names.
//! - [`hooks`] - Recording load stages and container-wait hooks.
//! - [`config`] - Canonical test configurations.
//! - [`wait`] - Polling helpers for concurrency tests.

pub mod apps;
pub mod config;
pub mod domain;
pub mod hooks;
pub mod wait;
