//! Pipeline execution
//!
//! Runs the stages of one run in order:
//! - Opening the run log
//! - Launching each stage and recording its output
//! - Stopping at the first stage that does not succeed
//!
//! Every fault is turned into the run's `PipelineResult`; nothing escapes
//! to the caller.

use relay_core::domain::plan::RunPlan;
use relay_core::domain::result::{PipelineResult, PipelineStatus};
use relay_core::domain::stage::StageSpec;
use relay_core::domain::state::RunState;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::launcher::{StageLauncher, StageOutput};
use super::run_log::{self, FailureBlock, RunLog};

/// Executes the pipeline of a single run
pub struct PipelineExecutor {
    launcher: Arc<dyn StageLauncher>,
    stage_timeout: Option<Duration>,
}

/// Why a run stopped early
enum RunFailure {
    Stage { stage: StageSpec, output: StageOutput },
    TimedOut { stage: StageSpec, timeout: Duration },
    Unexpected(String),
}

impl PipelineExecutor {
    pub fn new(launcher: Arc<dyn StageLauncher>, stage_timeout: Option<Duration>) -> Self {
        Self {
            launcher,
            stage_timeout,
        }
    }

    /// Runs every stage of `plan` and returns the run's single result
    pub async fn execute(&self, plan: &RunPlan) -> PipelineResult {
        let started_at = chrono::Utc::now();
        let mut state = RunState::Pending;

        info!(
            "--- Starting run {} (log: {}) ---",
            plan.identity,
            plan.log_path.display()
        );

        let outcome = self.run_stages(plan, &mut state).await;

        // The run log is closed at this point; failure blocks reopen it.
        let status = match outcome {
            Ok(()) => {
                advance(&mut state, RunState::Succeeded, plan);
                info!("--- Finished run {} ---", plan.identity);
                PipelineStatus::Success
            }
            Err(RunFailure::Stage { stage, output }) => {
                advance(&mut state, RunState::Failed, plan);
                error!(
                    "!!! Stage {} failed for {} (exit code {:?}) !!!",
                    stage.name, plan.identity, output.exit_code
                );
                run_log::append_failure(
                    &plan.log_path,
                    &FailureBlock::StageFailed {
                        stage: &stage,
                        output: &output,
                    },
                )
                .await;
                PipelineStatus::stage_failed(stage.name, output.exit_code, &output.stderr)
            }
            Err(RunFailure::TimedOut { stage, timeout }) => {
                advance(&mut state, RunState::Failed, plan);
                error!(
                    "!!! Stage {} timed out after {:?} for {} !!!",
                    stage.name, timeout, plan.identity
                );
                run_log::append_failure(
                    &plan.log_path,
                    &FailureBlock::TimedOut {
                        stage: &stage,
                        timeout,
                    },
                )
                .await;
                PipelineStatus::TimedOut {
                    stage: stage.name,
                    timeout,
                }
            }
            Err(RunFailure::Unexpected(message)) => {
                advance(&mut state, RunState::Errored, plan);
                error!(
                    "!!! An unexpected error occurred for {}: {} !!!",
                    plan.identity, message
                );
                run_log::append_failure(&plan.log_path, &FailureBlock::Unexpected { message: &message })
                    .await;
                PipelineStatus::UnexpectedError { message }
            }
        };

        PipelineResult {
            identity: plan.identity.clone(),
            log_path: plan.log_path.clone(),
            status,
            started_at,
            finished_at: chrono::Utc::now(),
        }
    }

    async fn run_stages(&self, plan: &RunPlan, state: &mut RunState) -> Result<(), RunFailure> {
        let mut log = RunLog::create(&plan.log_path).await.map_err(|e| {
            RunFailure::Unexpected(format!(
                "Failed to open run log {}: {}",
                plan.log_path.display(),
                e
            ))
        })?;

        for (idx, stage) in plan.stages.iter().enumerate() {
            advance(state, RunState::Running(idx), plan);
            info!(
                "Running {} ({}/{}) for {}",
                stage.name,
                idx + 1,
                plan.stages.len(),
                plan.identity
            );

            log.command(stage).await.map_err(|e| log_write_failure(&log, e))?;

            let output = self.launch(stage).await?;

            if !output.success {
                return Err(RunFailure::Stage {
                    stage: stage.clone(),
                    output,
                });
            }

            log.stage_output(stage, &output)
                .await
                .map_err(|e| log_write_failure(&log, e))?;

            info!("{} Complete for {}", stage.name, plan.identity);
        }

        Ok(())
    }

    async fn launch(&self, stage: &StageSpec) -> Result<StageOutput, RunFailure> {
        let launched = match self.stage_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.launcher.launch(stage))
                .await
                .map_err(|_| RunFailure::TimedOut {
                    stage: stage.clone(),
                    timeout,
                })?,
            None => self.launcher.launch(stage).await,
        };

        launched.map_err(|e| {
            RunFailure::Unexpected(format!(
                "Failed to launch stage {} ({}): {}",
                stage.name, stage.program, e
            ))
        })
    }
}

fn log_write_failure(log: &RunLog, e: std::io::Error) -> RunFailure {
    RunFailure::Unexpected(format!(
        "Failed to write run log {}: {}",
        log.path().display(),
        e
    ))
}

fn advance(state: &mut RunState, next: RunState, plan: &RunPlan) {
    if !state.can_transition_to(next) {
        warn!(
            "Unexpected state change for {}: {} -> {}",
            plan.identity, state, next
        );
    }
    debug!("{}: {} -> {}", plan.identity, state, next);
    *state = next;
}
