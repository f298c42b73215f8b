//! Appswitch - lifecycle orchestration for independently loaded sub-applications.
//!
//! A host program registers sub-applications ("apps") that each bring a
//! loader. On every navigation the host's router produces a match result and
//! the [`Host`](application::Host) switches: apps that are no longer matched
//! are unmounted while matched ones are loaded and mounted batch by batch,
//! parents before the apps nested inside them.
//!
//! # Architecture
//!
//! - **`domain`** - Names, statuses, route declarations and match results
//! - **`port`** - Seams to the host: lifecycle functions, router, container fallback
//! - **`application`** - App state machine, registry, switcher and load pipeline
//! - **`infrastructure`** - Configuration, logging setup and host wiring
//! - **`adapter`** - Recording router and simulated apps
//! - **`cli`** - Scenario runner behind the `appswitch` binary
//!
//! # Example
//!
//! ```no_run
//! use appswitch::application::{AppConfig, Host};
//! use appswitch::domain::{MatchedResult, MatchedRoute};
//! use appswitch::port::{LifeCycles, MountResult};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let host = Host::builder().build();
//! host.register_app(AppConfig::new("orders").with_loader(|_| async {
//!     Ok(LifeCycles::new().with_mount(|_| async { Ok(MountResult::default()) }))
//! }))?;
//!
//! let report = host
//!     .switch(MatchedResult::new(vec![MatchedRoute::new("/orders", ["orders"])]))
//!     .await;
//! assert_eq!(report.mounted, vec!["orders"]);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
