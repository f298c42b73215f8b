//! Handler for the `run` command.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::adapter::simulated::{EventLog, SimEvent, SimulatedApp};
use crate::adapter::RecordingRouter;
use crate::application::SwitchReport;
use crate::cli::scenario::Scenario;
use crate::cli::{output, RunArgs};
use crate::domain::AppSnapshot;
use crate::error::Result;
use crate::infrastructure::bootstrap::build_host;
use crate::infrastructure::config::Config;

#[derive(Debug, Serialize)]
struct RunSummary {
    switches: Vec<LabelledReport>,
    apps: Vec<AppSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    events: Option<Vec<SimEvent>>,
}

#[derive(Debug, Serialize)]
struct LabelledReport {
    label: String,
    report: SwitchReport,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the config or scenario cannot be loaded, or the
/// scenario registers an app twice.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }
    config.init_logging();

    let scenario = Scenario::load(&args.scenario)?;
    info!(
        apps = scenario.apps.len(),
        navigations = scenario.navigations.len(),
        "Scenario loaded"
    );

    let host = build_host(&config, Arc::new(RecordingRouter::new()));
    let log = EventLog::new();
    host.register_apps(
        scenario
            .apps
            .iter()
            .map(|spec| SimulatedApp::new(spec.clone(), log.clone()).app_config()),
    )?;
    host.start();

    if !scenario.prefetch.is_empty() {
        host.prefetch(&scenario.prefetch).await?;
    }

    let mut switches = Vec::with_capacity(scenario.navigations.len());
    for (index, navigation) in scenario.navigations.iter().enumerate() {
        let report = host.switch(navigation.matched()).await;
        if !args.json {
            output::section(&format!("Navigation {}: {}", index + 1, navigation.title()));
            output::report(&report);
        }
        switches.push(LabelledReport {
            label: navigation.title(),
            report,
        });
    }

    let apps = host.snapshot();
    if args.json {
        let summary = RunSummary {
            switches,
            apps,
            events: args.events.then(|| log.events()),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    output::section("Apps");
    output::snapshot(&apps);
    if args.events {
        output::section("Events");
        for event in log.events() {
            output::key_value(&format!("{:>6}ms", event.at_ms), format!("{} {:?}", event.app, event.phase));
        }
    }
    Ok(())
}
