//! Configuration module
//!
//! Handles CLI configuration: where the sweep file lives and how it is
//! loaded and narrowed down to the requested scenes.

use anyhow::{Context, Result};
use relay_core::config::SweepConfig;
use std::path::PathBuf;
use tracing::info;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the sweep file, if any
    pub sweep_path: Option<PathBuf>,
}

impl Config {
    /// Loads and validates the sweep, keeping only `scenes` when given
    pub fn load_sweep(&self, scenes: &[String]) -> Result<SweepConfig> {
        let mut sweep = match &self.sweep_path {
            Some(path) => {
                info!("Loading sweep from {}", path.display());
                SweepConfig::from_file(path)
                    .with_context(|| format!("Failed to load sweep file {}", path.display()))?
            }
            None => {
                info!("No sweep file given, using defaults");
                SweepConfig::default()
            }
        };

        sweep.select_scenes(scenes)?;
        sweep.validate().context("Invalid sweep configuration")?;

        Ok(sweep)
    }
}
