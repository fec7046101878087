//! Pipeline result domain types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::identity::RunIdentity;
use super::state::RunState;

/// Number of trailing stderr lines kept on a failed stage
pub const STDERR_TAIL_LINES: usize = 20;

/// Terminal outcome of one run
///
/// Produced exactly once per identity by the worker that executed it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub identity: RunIdentity,
    pub log_path: PathBuf,
    pub status: PipelineStatus,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    /// Every stage exited successfully
    Success,
    /// A stage exited with a failure status; later stages never ran
    StageFailed {
        stage: String,
        /// `None` when the process was terminated by a signal
        exit_code: Option<i32>,
        stderr_tail: String,
    },
    /// A stage exceeded the configured per-stage timeout and was killed
    TimedOut { stage: String, timeout: Duration },
    /// Fault outside normal process exit semantics (log I/O, missing program, ...)
    UnexpectedError { message: String },
}

impl PipelineResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, PipelineStatus::Success)
    }

    /// One-line summary, e.g. `Success for fern_3_0`
    pub fn summary_line(&self) -> String {
        match &self.status {
            PipelineStatus::Success => format!("Success for {}", self.identity),
            PipelineStatus::StageFailed { .. } => format!("Error in {}", self.identity),
            PipelineStatus::TimedOut { .. } => format!("Timed Out in {}", self.identity),
            PipelineStatus::UnexpectedError { .. } => {
                format!("Unexpected Error in {}", self.identity)
            }
        }
    }

    /// Terminal state of the run's state machine
    pub fn state(&self) -> RunState {
        match self.status {
            PipelineStatus::Success => RunState::Succeeded,
            PipelineStatus::StageFailed { .. } | PipelineStatus::TimedOut { .. } => {
                RunState::Failed
            }
            PipelineStatus::UnexpectedError { .. } => RunState::Errored,
        }
    }
}

impl PipelineStatus {
    /// Builds a `StageFailed` status keeping only the tail of stderr
    pub fn stage_failed(stage: impl Into<String>, exit_code: Option<i32>, stderr: &str) -> Self {
        Self::StageFailed {
            stage: stage.into(),
            exit_code,
            stderr_tail: tail_lines(stderr, STDERR_TAIL_LINES),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::UnexpectedError {
            message: message.into(),
        }
    }
}

/// Returns the last `n` lines of `text`
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
