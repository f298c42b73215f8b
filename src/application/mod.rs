//! Application services.
//!
//! These services own the app state machine and coordinate the ports to
//! switch between apps on navigation.

pub mod app;
pub mod host;
pub mod registry;
pub mod switch;

pub use app::{App, AppConfig, AppConfigProps};
pub use host::{Host, HostBuilder};
pub use registry::AppRegistry;
pub use switch::{AppSwitcher, SwitchContext, SwitchReport};
