//! Sweep file
//!
//! A sweep describes which runs to execute and the pipeline each run goes
//! through. It is read from a JSON file; every field is optional and falls
//! back to the view-synthesis sweep defaults.
//!
//! ```json
//! {
//!     "scenes": ["fern", "flower"],
//!     "base_source_path": "dataset/nerf_llff_data_custom",
//!     "base_output_path": "output",
//!     "n_views": 3,
//!     "iteration": 10000,
//!     "num_runs": 10,
//!     "max_parallel_runs": 4,
//!     "stage_timeout_secs": 7200,
//!     "stages": [
//!         { "name": "Train", "program": "python", "args": ["train.py", "--idx", "{index}"] }
//!     ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::domain::identity::{RunIdentity, RunPaths};
use crate::domain::plan::RunPlan;
use crate::error::{ConfigError, Result};
use crate::template::{self, Placeholders, StageTemplate};

/// Sweep definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Scenes processed one after another; each scene is one parallel batch
    pub scenes: Vec<String>,
    pub base_source_path: PathBuf,
    pub base_output_path: PathBuf,
    pub n_views: u32,
    /// Checkpoint iteration handed to the render and evaluation stages
    pub iteration: u32,
    /// Runs per scene, indexed `0..num_runs`
    pub num_runs: u32,
    /// Parallelism width; the runner default applies when unset
    pub max_parallel_runs: Option<usize>,
    /// Per-stage timeout; stages may run indefinitely when unset
    pub stage_timeout_secs: Option<u64>,
    pub stages: Vec<StageTemplate>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            scenes: [
                "fern", "flower", "fortress", "horns", "leaves", "orchids", "room", "trex",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            base_source_path: PathBuf::from("dataset/nerf_llff_data_custom"),
            base_output_path: PathBuf::from("output"),
            n_views: 3,
            iteration: 10_000,
            num_runs: 10,
            max_parallel_runs: None,
            stage_timeout_secs: None,
            stages: template::default_stages(),
        }
    }
}

impl SweepConfig {
    /// Parses a sweep from JSON
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Reads and parses a sweep file
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source)
    }

    /// Validates the sweep
    pub fn validate(&self) -> Result<()> {
        if self.scenes.is_empty() {
            return Err(ConfigError::NoScenes);
        }

        if self.num_runs == 0 {
            return Err(ConfigError::NoRuns);
        }

        if self.max_parallel_runs == Some(0) {
            return Err(ConfigError::InvalidParallelism);
        }

        if self.stage_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidTimeout);
        }

        template::validate_templates(&self.stages)?;

        let mut seen = HashSet::new();
        for scene in &self.scenes {
            if !seen.insert(scene) {
                let identity = RunIdentity::new(scene.clone(), self.n_views, 0);
                return Err(ConfigError::DuplicateRun {
                    key: identity.key(),
                    log: self.paths(&identity).log,
                });
            }
        }

        Ok(())
    }

    /// Restricts the sweep to the given scenes, keeping the order in which
    /// they are requested
    pub fn select_scenes(&mut self, requested: &[String]) -> Result<()> {
        if requested.is_empty() {
            return Ok(());
        }

        for scene in requested {
            if !self.scenes.contains(scene) {
                return Err(ConfigError::UnknownScene(scene.clone()));
            }
        }
        self.scenes = requested.to_vec();
        Ok(())
    }

    /// Identities of one scene batch in submission order
    pub fn identities(&self, scene: &str) -> Vec<RunIdentity> {
        (0..self.num_runs)
            .map(|index| RunIdentity::new(scene, self.n_views, index))
            .collect()
    }

    pub fn paths(&self, identity: &RunIdentity) -> RunPaths {
        RunPaths::derive(identity, &self.base_source_path, &self.base_output_path)
    }

    /// Resolves every run of a scene into an executable plan
    ///
    /// Fails before anything runs if a template cannot be resolved or two
    /// runs would share a log file.
    pub fn plans_for_scene(&self, scene: &str) -> Result<Vec<RunPlan>> {
        let mut logs = HashSet::new();

        self.identities(scene)
            .into_iter()
            .map(|identity| {
                let paths = self.paths(&identity);
                if !logs.insert(paths.log.clone()) {
                    return Err(ConfigError::DuplicateRun {
                        key: identity.key(),
                        log: paths.log,
                    });
                }

                let placeholders = Placeholders::for_run(&identity, &paths, self.iteration);
                let stages = template::resolve_all(&self.stages, &placeholders)?;

                Ok(RunPlan {
                    identity,
                    stages,
                    log_path: paths.log,
                })
            })
            .collect()
    }
}
