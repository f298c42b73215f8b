//! Handler for the `plan` command.

use std::sync::Arc;

use serde::Serialize;

use crate::adapter::simulated::{EventLog, SimulatedApp};
use crate::adapter::RecordingRouter;
use crate::application::Host;
use crate::cli::scenario::Scenario;
use crate::cli::{output, PlanArgs};
use crate::domain::AppName;
use crate::error::Result;
use crate::infrastructure::config::LoggingConfig;

#[derive(Debug, Serialize)]
struct PlannedNavigation {
    label: String,
    batches: Vec<Vec<AppName>>,
    unknown: Vec<AppName>,
}

/// Execute the plan command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be loaded or registered.
pub fn execute(args: &PlanArgs) -> Result<()> {
    LoggingConfig {
        level: "warn".into(),
        ..LoggingConfig::default()
    }
    .init();

    let scenario = Scenario::load(&args.scenario)?;
    let host = Host::builder()
        .router(Arc::new(RecordingRouter::new()))
        .build();
    let log = EventLog::new();
    host.register_apps(
        scenario
            .apps
            .iter()
            .map(|spec| SimulatedApp::new(spec.clone(), log.clone()).app_config()),
    )?;

    let planned: Vec<_> = scenario
        .navigations
        .iter()
        .map(|navigation| {
            let (plan, unknown) = host.plan(&navigation.matched());
            PlannedNavigation {
                label: navigation.title(),
                batches: plan.names(),
                unknown,
            }
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }

    for (index, navigation) in scenario.navigations.iter().enumerate() {
        output::section(&format!("Navigation {}: {}", index + 1, navigation.title()));
        let (plan, unknown) = host.plan(&navigation.matched());
        output::plan(&plan, &unknown);
    }
    Ok(())
}
