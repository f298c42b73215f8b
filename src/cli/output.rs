//! Shared CLI output helpers for consistent operator-facing text.

use std::fmt::Display;

use crate::application::SwitchReport;
use crate::application::switch::GroupPlan;
use crate::domain::{AppName, AppSnapshot};

const RULE_WIDTH: usize = 56;

/// Print a section header and separator.
pub fn section(title: &str) {
    println!();
    println!("{title}");
    println!("{}", "─".repeat(RULE_WIDTH));
}

/// Print a simple key/value line.
pub fn key_value(label: &str, value: impl Display) {
    println!("{label:<14} {value}");
}

/// Print a successful status line.
pub fn ok(message: &str) {
    println!("✓ {message}");
}

/// Print a warning status line.
pub fn warn(message: &str) {
    println!("⚠ {message}");
}

/// Print an error status line.
pub fn error(message: &str) {
    eprintln!("✗ {message}");
}

fn names(names: &[AppName]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names
            .iter()
            .map(AppName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Print the batches of a plan.
pub fn plan(plan: &GroupPlan, unknown: &[AppName]) {
    if plan.is_empty() {
        warn("nothing to activate");
    }
    for (index, batch) in plan.names().iter().enumerate() {
        key_value(&format!("batch {index}"), names(batch));
    }
    if !unknown.is_empty() {
        warn(&format!("not registered: {}", names(unknown)));
    }
}

/// Print a finished switch.
pub fn report(report: &SwitchReport) {
    key_value(
        "batches",
        format!("{}/{}", report.batches_run, report.batches_planned),
    );
    key_value("mounted", names(&report.mounted));
    key_value("unmounted", names(&report.unmounted));
    if !report.deferred.is_empty() {
        key_value("deferred", names(&report.deferred));
    }
    for failed in report.failed.iter().chain(&report.unmount_failed) {
        warn(&format!("{}: {}", failed.app, failed.error));
    }
    for stage in &report.stage_errors {
        warn(&format!("stage {} (batch {}): {}", stage.stage, stage.batch, stage.error));
    }
    if !report.unknown.is_empty() {
        warn(&format!("not registered: {}", names(&report.unknown)));
    }
    if report.cancelled {
        warn("superseded by a newer switch");
    } else if report.is_clean() {
        ok("switch complete");
    }
}

/// Print the status of every app.
pub fn snapshot(apps: &[AppSnapshot]) {
    for app in apps {
        key_value(app.name.as_str(), app.status);
    }
}
