//! Runner configuration
//!
//! Defines the runtime parameters of a dispatch: how many runs may execute
//! at once and how long a single stage may take.

use relay_core::ConfigError;
use std::time::Duration;

/// Runner configuration
///
/// The parallelism width is independent of the number of runs in a batch
/// so a sweep never oversubscribes the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Max runs executing at the same time
    pub max_parallel_runs: usize,

    /// Max time a single stage may run before it is killed
    pub stage_timeout: Option<Duration>,
}

impl Config {
    /// Creates a new configuration with the given width and no timeout
    pub fn new(max_parallel_runs: usize) -> Self {
        Self {
            max_parallel_runs,
            stage_timeout: None,
        }
    }

    pub fn with_max_parallel_runs(mut self, max_parallel_runs: usize) -> Self {
        self.max_parallel_runs = max_parallel_runs;
        self
    }

    pub fn with_stage_timeout(mut self, stage_timeout: Duration) -> Self {
        self.stage_timeout = Some(stage_timeout);
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel_runs == 0 {
            return Err(ConfigError::InvalidParallelism);
        }

        if self.stage_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(num_cpus::get().max(1))
    }
}
