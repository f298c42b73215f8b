//! Infrastructure: configuration, logging setup and host wiring.

pub mod bootstrap;
pub mod config;

pub use bootstrap::build_host;
pub use config::Config;
