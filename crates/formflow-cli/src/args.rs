use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::{
    FormCommands, ProcessCommands, ProgressCommands, RunCommands, StatsCommands, StepCommands,
    SubmissionCommands, SweepArgs,
};

/// Track visitors through multi-step form processes
///
/// Formflow stores forms, processes built from them and every visitor's
/// progress through those processes in a local SQLite database. Owners
/// define processes with the `form`, `process` and `step` commands; `run`
/// drives a visitor through a process; `progress`, `stats` and `sweep`
/// inspect and maintain what visitors left behind. `serve` exposes the same
/// operations as an MCP server on stdio.
#[derive(Parser)]
#[command(version, about, name = "ff")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/formflow/formflow.db
    #[arg(long, global = true)]
    pub database_file: Option<PathBuf>,

    /// Path to the JSON settings file. Defaults to
    /// $XDG_CONFIG_HOME/formflow/config.json
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print results as JSON instead of markdown
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage forms and their fields
    #[command(alias = "f")]
    Form {
        #[command(subcommand)]
        command: FormCommands,
    },
    /// Manage processes
    #[command(alias = "p")]
    Process {
        #[command(subcommand)]
        command: ProcessCommands,
    },
    /// Manage the steps of a process
    #[command(alias = "s")]
    Step {
        #[command(subcommand)]
        command: StepCommands,
    },
    /// Move a visitor through a process
    #[command(alias = "r")]
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// Inspect progress records
    Progress {
        #[command(subcommand)]
        command: ProgressCommands,
    },
    /// Submit and list standalone form submissions
    Submission {
        #[command(subcommand)]
        command: SubmissionCommands,
    },
    /// Process analytics
    Stats {
        #[command(subcommand)]
        command: StatsCommands,
    },
    /// Mark idle progress records abandoned
    Sweep(SweepArgs),
    /// Start the MCP server
    Serve {
        /// Also run the abandonment sweeper while serving
        #[arg(long)]
        sweep: bool,
    },
}
