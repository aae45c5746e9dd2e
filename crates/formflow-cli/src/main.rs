//! Formflow CLI Application
//!
//! Command-line front end and MCP server for the formflow process tracker.

mod args;
mod cli;
mod mcp;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use formflow_core::{params::ListProcesses, Settings, Sweeper, TrackerBuilder};
use log::{info, warn};
use mcp::{run_stdio_server, FormflowMcpServer};
use renderer::{OutputMode, TerminalRenderer};
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        database_file,
        config_file,
        no_color,
        json,
        command,
    } = Args::parse();

    let mut settings =
        Settings::load(config_file.as_deref()).context("Failed to load settings")?;
    if let Some(Sweep(args)) = &command {
        args.apply(&mut settings);
    }
    let tracker = TrackerBuilder::new()
        .with_database_path(database_file)
        .with_settings(settings)
        .build()
        .await
        .context("Failed to initialize tracker")?;

    let mode = match (json, no_color) {
        (true, _) => OutputMode::Json,
        (false, true) => OutputMode::Plain,
        (false, false) => OutputMode::Rich,
    };
    let renderer = TerminalRenderer::new(mode);

    info!("Formflow started");

    match command {
        Some(Form { command }) => {
            Cli::new(tracker, renderer)
                .handle_form_command(command)
                .await
        }
        Some(Process { command }) => {
            Cli::new(tracker, renderer)
                .handle_process_command(command)
                .await
        }
        Some(Step { command }) => {
            Cli::new(tracker, renderer)
                .handle_step_command(command)
                .await
        }
        Some(Run { command }) => Cli::new(tracker, renderer).handle_run_command(command).await,
        Some(Progress { command }) => {
            Cli::new(tracker, renderer)
                .handle_progress_command(command)
                .await
        }
        Some(Submission { command }) => {
            Cli::new(tracker, renderer)
                .handle_submission_command(command)
                .await
        }
        Some(Stats { command }) => {
            Cli::new(tracker, renderer)
                .handle_stats_command(command)
                .await
        }
        Some(Sweep(args)) => {
            Cli::new(tracker, renderer)
                .handle_sweep(args, shutdown_signal())
                .await
        }
        Some(Serve { sweep }) => {
            let sweeper = sweep.then(|| {
                let sweeper = Sweeper::new(tracker.clone());
                tokio::spawn(async move {
                    if let Err(e) = sweeper.run_until(std::future::pending::<()>()).await {
                        warn!("Sweeper stopped: {e}");
                    }
                })
            });

            info!("Starting Formflow MCP server");
            let result = run_stdio_server(FormflowMcpServer::new(tracker))
                .await
                .context("MCP server failed");
            if let Some(handle) = sweeper {
                handle.abort();
            }
            result
        }
        None => {
            Cli::new(tracker, renderer)
                .list_processes(&ListProcesses::default())
                .await
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, stopping"),
        _ = terminate => info!("Received SIGTERM, stopping"),
    }
}
