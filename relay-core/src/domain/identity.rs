//! Run identity domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of one independent run
///
/// A run is keyed by the scene it trains on, the number of training views
/// and its index within the scene batch. The key doubles as the stem of the
/// run's model directory and log file, so two identities with the same key
/// would collide on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunIdentity {
    pub scene: String,
    pub n_views: u32,
    pub index: u32,
}

impl RunIdentity {
    pub fn new(scene: impl Into<String>, n_views: u32, index: u32) -> Self {
        Self {
            scene: scene.into(),
            n_views,
            index,
        }
    }

    /// Unique key, e.g. `fern_3_7`
    pub fn key(&self) -> String {
        format!("{}_{}_{}", self.scene, self.n_views, self.index)
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// File-system paths derived from a run identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPaths {
    /// Input dataset directory of the scene
    pub source: PathBuf,
    /// Output directory the stages write the trained model into
    pub model: PathBuf,
    /// Per-run log file
    pub log: PathBuf,
}

impl RunPaths {
    /// Derives the paths of a run
    ///
    /// Layout:
    /// - `<source_root>/<scene>`
    /// - `<output_root>/<scene>/<key>`
    /// - `<output_root>/<scene>/run_<key>.log`
    pub fn derive(identity: &RunIdentity, source_root: &Path, output_root: &Path) -> Self {
        let scene_output = output_root.join(&identity.scene);
        let key = identity.key();

        Self {
            source: source_root.join(&identity.scene),
            model: scene_output.join(&key),
            log: scene_output.join(format!("run_{}.log", key)),
        }
    }
}
