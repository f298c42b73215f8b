//! App switching.
//!
//! A switch turns one [`MatchedResult`](crate::domain::MatchedResult) into a
//! [`GroupPlan`] of batches ordered by route depth, runs it through the
//! [`LoadPipeline`] and unmounts the apps the previous switch left active.

mod context;
mod pipeline;
mod plan;
mod report;
mod stage;
mod switcher;

pub use context::SwitchContext;
pub use pipeline::{BatchOutcome, LoadHookContext, LoadPipeline, LoadStage};
pub use plan::{GroupPlan, PlannedApp};
pub use report::{FailedApp, StageFailure, SwitchReport};
pub use stage::ChildContainerStage;
pub use switcher::AppSwitcher;
