//! Pure domain types: identifiers, statuses, route declarations.

mod id;
mod route;
mod snapshot;
mod status;

pub use id::{AppName, SwitchId};
pub use route::{MatchedResult, MatchedRoute, RouteConfig};
pub use snapshot::AppSnapshot;
pub use status::{AppStatus, Operation};
