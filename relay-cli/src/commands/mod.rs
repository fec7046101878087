//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod plan;
mod run;

use plan::PlanArgs;
use run::RunArgs;

use anyhow::Result;
use clap::Subcommand;
use std::process::ExitCode;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the sweep: every run of every selected scene
    Run(RunArgs),
    /// Print the resolved commands and log paths without running anything
    Plan(PlanArgs),
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// The process exit code
pub async fn handle_command(command: Commands, config: &Config) -> Result<ExitCode> {
    match command {
        Commands::Run(args) => run::handle_run_command(args, config).await,
        Commands::Plan(args) => plan::handle_plan_command(args, config),
    }
}
