//! Infrastructure configuration modules.

pub mod logging;
pub mod settings;
pub mod switcher;

pub use logging::LoggingConfig;
pub use settings::Config;
pub use switcher::SwitcherConfig;
