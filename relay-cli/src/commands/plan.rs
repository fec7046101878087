//! Plan command handler
//!
//! Shows what a sweep would execute: per run, its log file and the fully
//! resolved command of every stage.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use relay_core::domain::plan::RunPlan;
use std::process::ExitCode;

use crate::config::Config;

/// Arguments of `relay plan`
#[derive(Args)]
pub struct PlanArgs {
    /// Only these scenes (repeatable); all configured scenes by default
    #[arg(long = "scene", short)]
    scenes: Vec<String>,

    /// Print the plans as JSON
    #[arg(long)]
    json: bool,
}

/// Handle the plan command
pub fn handle_plan_command(args: PlanArgs, config: &Config) -> Result<ExitCode> {
    let sweep = config.load_sweep(&args.scenes)?;

    let mut all_plans = Vec::new();
    for scene in &sweep.scenes {
        all_plans.extend(sweep.plans_for_scene(scene)?);
    }

    if args.json {
        let json = serde_json::to_string_pretty(&all_plans).context("Failed to serialize plans")?;
        println!("{}", json);
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "{}",
        format!(
            "{} scene(s), {} run(s), {} stage(s) per run:",
            sweep.scenes.len(),
            all_plans.len(),
            sweep.stages.len()
        )
        .bold()
    );
    println!();

    for plan in &all_plans {
        print_plan(plan);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_plan(plan: &RunPlan) {
    println!("{} {}", "Run:".bold(), plan.identity.to_string().cyan());
    println!("  Log: {}", plan.log_path.display());
    for stage in &plan.stages {
        println!("  {:<8} {}", format!("{}:", stage.name), stage.command_line().dimmed());
    }
    println!();
}
