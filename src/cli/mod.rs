//! Command-line interface definitions.

pub mod output;
pub mod plan;
pub mod run;
pub mod scenario;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Appswitch - drive simulated sub-applications through navigation scenarios.
#[derive(Parser, Debug)]
#[command(name = "appswitch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the activation batches of every navigation
    Plan(PlanArgs),

    /// Run every navigation of a scenario against simulated apps
    Run(RunArgs),
}

/// Arguments for the `plan` subcommand.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Path to scenario file
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to scenario file
    #[arg(short, long)]
    pub scenario: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Print switch reports as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print the simulated lifecycle events
    #[arg(long)]
    pub events: bool,
}
