//! Run dispatcher
//!
//! Fans a batch of run plans out over a bounded set of workers and collects
//! one result per run. Each run executes in its own task; a semaphore caps
//! how many of them hold a worker slot at the same time.

use relay_core::ConfigError;
use relay_core::domain::plan::RunPlan;
use relay_core::domain::result::{PipelineResult, PipelineStatus};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::service::run_log::{self, FailureBlock};
use crate::service::{PipelineExecutor, StageLauncher};

/// Dispatches runs with bounded parallelism
pub struct Dispatcher {
    config: Config,
    executor: Arc<PipelineExecutor>,
}

/// Results of one dispatched batch, in submission order
#[derive(Debug, Clone)]
pub struct DispatchReport {
    results: Vec<PipelineResult>,
}

impl Dispatcher {
    /// Creates a dispatcher, rejecting invalid configuration
    pub fn new(config: Config, launcher: Arc<dyn StageLauncher>) -> Result<Self, ConfigError> {
        config.validate()?;

        let executor = Arc::new(PipelineExecutor::new(launcher, config.stage_timeout));
        Ok(Self { config, executor })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs every plan and waits for all of them
    ///
    /// A run that fails, errors or panics only affects its own result.
    /// Results come back in the order the plans were given, whatever
    /// order the runs finished in.
    pub async fn dispatch(&self, plans: Vec<RunPlan>) -> Result<DispatchReport, ConfigError> {
        validate_plans(&plans)?;

        info!(
            "Dispatching {} run(s) on {} worker(s)",
            plans.len(),
            self.config.max_parallel_runs
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_runs));

        let handles: Vec<_> = plans
            .into_iter()
            .map(|plan| {
                let identity = plan.identity.clone();
                let log_path = plan.log_path.clone();
                let handle = self.spawn_run(plan, Arc::clone(&semaphore));
                (identity, log_path, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());

        for (identity, log_path, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    error!("Run task for {} failed: {}", identity, e);
                    let message = format!("Run task failed: {}", e);
                    run_log::append_failure(&log_path, &FailureBlock::Unexpected { message: &message })
                        .await;
                    let now = chrono::Utc::now();
                    PipelineResult {
                        identity,
                        log_path,
                        status: PipelineStatus::UnexpectedError { message },
                        started_at: now,
                        finished_at: now,
                    }
                }
            };
            debug!("{} reached {}", result.identity, result.state());
            results.push(result);
        }

        let report = DispatchReport { results };
        info!(
            "Dispatch done: {} succeeded, {} did not",
            report.succeeded(),
            report.failed()
        );

        Ok(report)
    }

    /// Spawns a task executing one run once a worker slot is free
    fn spawn_run(&self, plan: RunPlan, semaphore: Arc<Semaphore>) -> JoinHandle<PipelineResult> {
        let executor = Arc::clone(&self.executor);

        tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    let now = chrono::Utc::now();
                    return PipelineResult {
                        identity: plan.identity,
                        log_path: plan.log_path,
                        status: PipelineStatus::unexpected(format!(
                            "Worker pool unavailable: {}",
                            e
                        )),
                        started_at: now,
                        finished_at: now,
                    };
                }
            };

            debug!("Worker slot acquired for {}", plan.identity);
            executor.execute(&plan).await
            // Permit is released when dropped
        })
    }
}

/// Rejects batches that cannot run as independent runs
fn validate_plans(plans: &[RunPlan]) -> Result<(), ConfigError> {
    let mut identities = HashSet::new();
    let mut logs = HashSet::new();

    for plan in plans {
        if plan.stages.is_empty() {
            return Err(ConfigError::EmptyPipeline);
        }

        if !identities.insert(&plan.identity) || !logs.insert(&plan.log_path) {
            return Err(ConfigError::DuplicateRun {
                key: plan.identity.key(),
                log: plan.log_path.clone(),
            });
        }
    }

    Ok(())
}

impl DispatchReport {
    pub fn results(&self) -> &[PipelineResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(PipelineResult::is_success)
    }

    /// One status line per run, in submission order
    pub fn summary_lines(&self) -> Vec<String> {
        self.results.iter().map(PipelineResult::summary_line).collect()
    }
}
