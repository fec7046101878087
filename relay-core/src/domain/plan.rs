//! Run plan domain types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::identity::RunIdentity;
use super::stage::StageSpec;

/// Everything a worker needs to execute one run
///
/// Stage arguments are already resolved for the identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    pub identity: RunIdentity,
    pub stages: Vec<StageSpec>,
    pub log_path: PathBuf,
}
