//! Configuration errors
//!
//! Every variant is fatal and raised before any run is dispatched.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration handling
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Invalid global parameters of a sweep
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Sweep file could not be read
    #[error("Failed to read sweep file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Sweep file is not valid JSON for the expected schema
    #[error("Failed to parse sweep file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Parallelism width must be at least one
    #[error("max_parallel_runs must be greater than 0")]
    InvalidParallelism,

    /// A zero timeout would kill every stage immediately
    #[error("stage_timeout must be greater than 0")]
    InvalidTimeout,

    #[error("pipeline has no stages")]
    EmptyPipeline,

    #[error("no scenes configured")]
    NoScenes,

    #[error("num_runs must be greater than 0")]
    NoRuns,

    /// A stage template is missing its name or program
    #[error("stage {index} is invalid: {reason}")]
    InvalidStage { index: usize, reason: String },

    /// Stage argument references a placeholder that does not exist
    #[error("unknown placeholder '{{{name}}}' in stage '{stage}'")]
    UnknownPlaceholder { stage: String, name: String },

    /// Stage argument has an opening brace without a closing one (or vice versa)
    #[error("unbalanced brace in stage '{stage}' argument '{arg}'")]
    UnbalancedBrace { stage: String, arg: String },

    /// Two runs would share a log file
    #[error("duplicate run {key} (log {log})")]
    DuplicateRun { key: String, log: PathBuf },

    /// Scene requested on the command line is not part of the sweep
    #[error("unknown scene '{0}'")]
    UnknownScene(String),
}
