//! Per-run log file
//!
//! Every run owns one plain-text log recording, stage by stage, the command
//! that was executed and everything it printed:
//!
//! ```text
//! Executing: python train.py --idx 0
//!
//! --- Train Output ---
//! ...
//! --- Train Error ---
//! ...
//! --- Train Complete ---
//! ```
//!
//! A run that ends badly gets one trailing `!!! ERROR !!!` (or timeout /
//! unexpected error) block, appended after the log handle was closed.

use relay_core::domain::stage::StageSpec;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::launcher::StageOutput;

/// Append-only log of one run
///
/// Created (or truncated) when the run starts; closed when dropped.
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Creates the log, truncating any log left by a previous sweep
    pub async fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = File::create(path).await?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records the command a stage is about to run
    pub async fn command(&mut self, stage: &StageSpec) -> std::io::Result<()> {
        self.write_section(&format_command(stage)).await
    }

    /// Records the output of a stage that completed successfully
    pub async fn stage_output(
        &mut self,
        stage: &StageSpec,
        output: &StageOutput,
    ) -> std::io::Result<()> {
        self.write_section(&format_stage_output(&stage.name, output))
            .await
    }

    async fn write_section(&mut self, text: &str) -> std::io::Result<()> {
        self.file.write_all(text.as_bytes()).await?;
        self.file.flush().await
    }
}

/// Trailing block describing why a run did not succeed
#[derive(Debug)]
pub enum FailureBlock<'a> {
    StageFailed {
        stage: &'a StageSpec,
        output: &'a StageOutput,
    },
    TimedOut {
        stage: &'a StageSpec,
        timeout: Duration,
    },
    Unexpected {
        message: &'a str,
    },
}

impl FailureBlock<'_> {
    pub fn render(&self) -> String {
        match self {
            FailureBlock::StageFailed { stage, output } => format!(
                "\n\n!!! ERROR !!!\nCommand: {}\nReturn Code: {}\nOutput:\n{}\nStderr:\n{}\n",
                stage.command_line(),
                output
                    .exit_code
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "terminated by signal".to_string()),
                output.stdout,
                output.stderr
            ),
            FailureBlock::TimedOut { stage, timeout } => format!(
                "\n\n!!! TIMEOUT !!!\nCommand: {}\nTimeout: {}s\n",
                stage.command_line(),
                timeout.as_secs_f64()
            ),
            FailureBlock::Unexpected { message } => {
                format!("\n\n!!! UNEXPECTED ERROR: {} !!!\n", message)
            }
        }
    }
}

/// Appends a failure block to a run log
///
/// Best effort: the run's outcome is already decided, so a failure to
/// write here is only reported through tracing.
pub async fn append_failure(path: &Path, block: &FailureBlock<'_>) {
    if let Err(e) = try_append(path, &block.render()).await {
        warn!(
            "Failed to append error block to {}: {}",
            path.display(),
            e
        );
    }
}

async fn try_append(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().append(true).create(true).open(path).await?;
    file.write_all(text.as_bytes()).await?;
    file.flush().await
}

pub fn format_command(stage: &StageSpec) -> String {
    format!("Executing: {}\n\n", stage.command_line())
}

pub fn format_stage_output(stage_name: &str, output: &StageOutput) -> String {
    format!(
        "--- {name} Output ---\n{}\n--- {name} Error ---\n{}\n--- {name} Complete ---\n\n",
        output.stdout,
        output.stderr,
        name = stage_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage() -> StageSpec {
        StageSpec::new(
            "Render",
            "python",
            vec!["render.py".to_string(), "--idx".to_string(), "4".to_string()],
        )
    }

    #[test]
    fn test_format_command() {
        assert_eq!(
            format_command(&stage()),
            "Executing: python render.py --idx 4\n\n"
        );
    }

    #[test]
    fn test_format_stage_output() {
        let output = StageOutput::succeeded("frames: 120\n", "");
        assert_eq!(
            format_stage_output("Render", &output),
            "--- Render Output ---\nframes: 120\n\n--- Render Error ---\n\n--- Render Complete ---\n\n"
        );
    }

    #[test]
    fn test_render_stage_failed_block() {
        let stage = stage();
        let output = StageOutput::failed(2, "partial", "CUDA out of memory");
        let block = FailureBlock::StageFailed {
            stage: &stage,
            output: &output,
        };

        assert_eq!(
            block.render(),
            "\n\n!!! ERROR !!!\nCommand: python render.py --idx 4\nReturn Code: 2\n\
             Output:\npartial\nStderr:\nCUDA out of memory\n"
        );
    }

    #[test]
    fn test_render_signal_exit() {
        let stage = stage();
        let output = StageOutput {
            exit_code: None,
            success: false,
            stdout: String::new(),
            stderr: String::new(),
        };
        let rendered = FailureBlock::StageFailed {
            stage: &stage,
            output: &output,
        }
        .render();
        assert!(rendered.contains("Return Code: terminated by signal"));
    }

    #[test]
    fn test_render_timeout_and_unexpected() {
        let stage = stage();
        let timeout = FailureBlock::TimedOut {
            stage: &stage,
            timeout: Duration::from_millis(1500),
        }
        .render();
        assert!(timeout.contains("!!! TIMEOUT !!!"));
        assert!(timeout.contains("Timeout: 1.5s"));

        let unexpected = FailureBlock::Unexpected {
            message: "No such file or directory",
        }
        .render();
        assert_eq!(
            unexpected,
            "\n\n!!! UNEXPECTED ERROR: No such file or directory !!!\n"
        );
    }
}
