//! Service layer
//!
//! Services contain the execution logic of the runner: launching stage
//! programs, writing run logs and driving a run through its pipeline.
//!
//! Process launching is trait-based so tests can substitute scripted
//! launchers for real programs.

mod execution;
mod launcher;
pub mod run_log;

// Re-export traits
pub use launcher::StageLauncher;

// Re-export implementations
pub use execution::PipelineExecutor;
pub use launcher::{StageOutput, StandardStageLauncher};
pub use run_log::RunLog;
