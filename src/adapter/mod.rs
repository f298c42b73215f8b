//! Adapters implementing the ports for in-process use.
//!
//! - [`router`] - Recording router for hosts that match routes themselves
//! - [`simulated`] - Simulated application bundles with scripted timing and failures

pub mod router;
pub mod simulated;

pub use router::RecordingRouter;
pub use simulated::{EventLog, Phase, SimEvent, SimulatedApp, SimulatedAppSpec};
