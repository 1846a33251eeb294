// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! muster - dependency-aware service supervisor.
//!
//! Every invocation is one-shot: load the manifest, recover whatever a
//! previous invocation left running, perform the requested operation, exit.
//! Exit codes: 0 success, 1 runtime failure, 2 configuration error.

mod color;
mod commands;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use exit_error::ExitError;
use muster_manifest::Manifest;
use muster_supervisor::Controller;
use std::path::PathBuf;
use std::process::ExitCode;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")");

#[derive(Parser)]
#[command(name = "muster", version = VERSION, about = "Dependency-aware service supervisor", styles = color::styles())]
struct Cli {
    /// Path to the fleet manifest
    #[arg(short = 'f', long, global = true, default_value = "muster.toml")]
    manifest: PathBuf,

    /// State directory (overrides the manifest's `state_dir`)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start all workers, or one worker and its dependencies
    Start {
        /// Worker name; everything when omitted
        name: Option<String>,
    },
    /// Stop all workers, or one worker and its dependents
    Stop {
        /// Worker name; everything when omitted
        name: Option<String>,
        /// Kill immediately instead of waiting out the grace period
        #[arg(long)]
        force: bool,
    },
    /// Restart one worker and its dependents
    Restart { name: String },
    /// Start the fleet and supervise it in the foreground until interrupted
    Run,
    /// Aggregated status across all workers
    Status {
        /// Limit output to one worker
        name: Option<String>,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recent output lines for one worker
    Logs {
        name: String,
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "200")]
        lines: usize,
        /// Follow log output
        #[arg(long)]
        follow: bool,
    },
    /// Re-attach to workers left running by a previous supervisor
    Recover,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.message);
            ExitCode::from(e.code)
        }
    }
}

async fn run(cli: Cli) -> Result<(), ExitError> {
    // Every manifest problem is fatal before any worker is touched.
    let manifest = Manifest::load(&cli.manifest)
        .map_err(|e| ExitError::new(2, format!("{:#}", anyhow::Error::new(e))))?;
    let state_dir = resolve_state_dir(&cli, &manifest)?;
    let controller = Controller::new(manifest, &state_dir)
        .map_err(|e| ExitError::new(1, format!("{:#}", anyhow::Error::new(e))))?;

    match cli.command {
        Command::Start { name } => commands::start::run(&controller, name.as_deref()).await,
        Command::Stop { name, force } => {
            commands::stop::run(&controller, name.as_deref(), force).await
        }
        Command::Restart { name } => commands::restart::run(&controller, &name).await,
        Command::Run => commands::run::run(&controller).await,
        Command::Status { name, json } => {
            commands::status::run(&controller, name.as_deref(), json).await
        }
        Command::Logs { name, lines, follow } => {
            commands::logs::run(&controller, &name, lines, follow).await
        }
        Command::Recover => commands::recover::run(&controller).await,
    }
}

fn resolve_state_dir(cli: &Cli, manifest: &Manifest) -> Result<PathBuf, ExitError> {
    if let Some(dir) = &cli.state_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = &manifest.supervisor.state_dir {
        return Ok(dir.clone());
    }
    dirs::home_dir()
        .map(|home| home.join(".muster").join("state"))
        .ok_or_else(|| ExitError::new(1, "cannot determine a state directory; pass --state-dir"))
}
