//! Run command handler
//!
//! Executes the sweep scene by scene. Each scene is dispatched as one
//! batch; its summary is printed once every run of the batch has ended.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use relay_core::config::SweepConfig;
use relay_core::domain::identity::RunIdentity;
use relay_core::domain::result::{PipelineResult, PipelineStatus};
use relay_runner::{Config as RunnerConfig, DispatchReport, Dispatcher, StandardStageLauncher};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;

/// Arguments of `relay run`
#[derive(Args)]
pub struct RunArgs {
    /// Only these scenes (repeatable); all configured scenes by default
    #[arg(long = "scene", short)]
    scenes: Vec<String>,

    /// Max runs executing at once [default: sweep file, then CPU count]
    #[arg(long, short = 'j', env = "RELAY_MAX_PARALLEL_RUNS")]
    parallelism: Option<usize>,

    /// Per-stage timeout in seconds [default: sweep file, then none]
    #[arg(long, env = "RELAY_STAGE_TIMEOUT")]
    stage_timeout: Option<u64>,

    /// Working directory the stage programs run in
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Exit with status 1 when any run did not succeed
    #[arg(long, env = "RELAY_FAIL_ON_ERROR")]
    fail_on_error: bool,
}

/// Handle the run command
pub async fn handle_run_command(args: RunArgs, config: &Config) -> Result<ExitCode> {
    let sweep = config.load_sweep(&args.scenes)?;
    let runner_config = runner_config(&args, &sweep);

    let mut launcher = StandardStageLauncher::new();
    if let Some(dir) = &args.workdir {
        launcher = launcher.with_working_dir(dir);
    }

    let dispatcher = Dispatcher::new(runner_config, Arc::new(launcher))
        .context("Invalid runner configuration")?;

    let mut all_succeeded = true;

    for scene in &sweep.scenes {
        let plans = sweep.plans_for_scene(scene)?;

        println!(
            "Starting parallel execution for scene '{}' with {} runs...",
            scene.bold(),
            plans.len()
        );
        println!(
            "Using {} parallel workers.",
            dispatcher.config().max_parallel_runs
        );

        for plan in &plans {
            debug!("{}", describe_paths(&sweep, &plan.identity));
        }

        let report = dispatcher.dispatch(plans).await?;
        print_summary(&report);
        all_succeeded &= report.all_succeeded();

        println!();
        println!("{}", "All runs completed.".bold());
    }

    if args.fail_on_error && !all_succeeded {
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

/// Command-line flags win over the sweep file, which wins over defaults
fn runner_config(args: &RunArgs, sweep: &SweepConfig) -> RunnerConfig {
    let mut config = RunnerConfig::default();

    if let Some(width) = args.parallelism.or(sweep.max_parallel_runs) {
        config = config.with_max_parallel_runs(width);
    }

    if let Some(secs) = args.stage_timeout.or(sweep.stage_timeout_secs) {
        config = config.with_stage_timeout(Duration::from_secs(secs));
    }

    config
}

fn describe_paths(sweep: &SweepConfig, identity: &RunIdentity) -> String {
    let paths = sweep.paths(identity);
    format!(
        "{}: Source Path: {}, Model Path: {}",
        identity,
        paths.source.display(),
        paths.model.display()
    )
}

fn print_summary(report: &DispatchReport) {
    println!();
    println!("{}", "--- Parallel Execution Summary ---".bold());
    for result in report.results() {
        println!("{}", colored_summary(result));
    }
}

fn colored_summary(result: &PipelineResult) -> ColoredString {
    let line = result.summary_line();
    match result.status {
        PipelineStatus::Success => line.green(),
        PipelineStatus::StageFailed { .. } => line.red(),
        PipelineStatus::TimedOut { .. } => line.yellow(),
        PipelineStatus::UnexpectedError { .. } => line.magenta(),
    }
}
