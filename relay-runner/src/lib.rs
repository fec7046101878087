//! Relay Runner
//!
//! Executes sweeps of independent runs, each a fixed sequence of external
//! stage programs.
//!
//! Architecture:
//! - Configuration: parallelism width and stage timeout
//! - Services: stage launching, run logs and the pipeline executor
//! - Scheduler: bounded fan-out of runs and result collection
//!
//! # Example
//!
//! ```no_run
//! use relay_core::config::SweepConfig;
//! use relay_runner::{Config, Dispatcher, StandardStageLauncher};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let sweep = SweepConfig::default();
//!     let dispatcher = Dispatcher::new(Config::new(4), Arc::new(StandardStageLauncher::new()))?;
//!
//!     let report = dispatcher.dispatch(sweep.plans_for_scene("fern")?).await?;
//!     for line in report.summary_lines() {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod scheduler;
pub mod service;

pub use config::Config;
pub use scheduler::{DispatchReport, Dispatcher};
pub use service::{PipelineExecutor, StageLauncher, StageOutput, StandardStageLauncher};
