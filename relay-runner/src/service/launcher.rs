//! Stage launcher
//!
//! Runs the external program behind a stage and captures its output.
//! Programs are spawned directly with their argument list; no shell is
//! involved, so arguments are never re-split or interpreted.

use async_trait::async_trait;
use relay_core::domain::stage::StageSpec;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured result of one finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput {
    /// Exit code, `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl StageOutput {
    pub fn succeeded(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn failed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            success: false,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Service trait for invoking stage programs
///
/// `Err` is reserved for faults outside normal process exit semantics
/// (program not found, permission denied); a process that runs and exits
/// with a failure status is an `Ok` with `success == false`.
///
/// Implementations must be cancel-safe: dropping the returned future
/// stops the process.
#[async_trait]
pub trait StageLauncher: Send + Sync {
    async fn launch(&self, stage: &StageSpec) -> std::io::Result<StageOutput>;
}

/// Launches stages as child processes of the runner
#[derive(Debug, Clone, Default)]
pub struct StandardStageLauncher {
    working_dir: Option<PathBuf>,
}

impl StandardStageLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every stage from `dir` instead of the runner's working directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[async_trait]
impl StageLauncher for StandardStageLauncher {
    async fn launch(&self, stage: &StageSpec) -> std::io::Result<StageOutput> {
        debug!("Spawning {}: {} {:?}", stage.name, stage.program, stage.args);

        let mut command = Command::new(&stage.program);
        command
            .args(&stage.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = command.output().await?;

        let result = StageOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            "{} exited: exit_code={:?}, stdout_len={}, stderr_len={}",
            stage.name,
            result.exit_code,
            result.stdout.len(),
            result.stderr.len()
        );

        Ok(result)
    }
}
