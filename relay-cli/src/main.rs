//! Relay CLI
//!
//! Command-line interface for running sweeps of multi-stage runs.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Run train/render/eval sweeps in parallel", long_about = None)]
struct Cli {
    /// Sweep file (JSON); built-in defaults are used when omitted
    #[arg(long, short, global = true, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=info,relay_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config {
        sweep_path: cli.config,
    };

    handle_command(cli.command, &config).await
}
