//! Shared fixtures for runner integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use relay_core::domain::identity::RunIdentity;
use relay_core::domain::plan::RunPlan;
use relay_core::domain::stage::StageSpec;
use relay_runner::{StageLauncher, StageOutput};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scratch directory removed on drop
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("relay-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Launcher that fakes stage programs
///
/// Every stage receives the run key as its first argument, which lets the
/// launcher decide per run whether a stage fails. It counts invocations per
/// stage and tracks how many launches are in flight at once.
pub struct MockLauncher {
    failures: Vec<(String, String)>,
    panics: Vec<(String, String)>,
    delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
    calls_by_run: Mutex<HashMap<String, Vec<String>>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self {
            failures: Vec::new(),
            panics: Vec::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            calls_by_run: Mutex::new(HashMap::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    /// Makes `stage` exit with status 1 for the run with key `run`
    pub fn failing(mut self, stage: &str, run: &str) -> Self {
        self.failures.push((stage.to_string(), run.to_string()));
        self
    }

    /// Makes `stage` panic for the run with key `run`
    pub fn panicking(mut self, stage: &str, run: &str) -> Self {
        self.panics.push((stage.to_string(), run.to_string()));
        self
    }

    /// Makes every launch take `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self, stage: &str) -> usize {
        self.calls.lock().unwrap().get(stage).copied().unwrap_or(0)
    }

    pub fn calls_for_run(&self, run: &str) -> Vec<String> {
        self.calls_by_run
            .lock()
            .unwrap()
            .get(run)
            .cloned()
            .unwrap_or_default()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StageLauncher for MockLauncher {
    async fn launch(&self, stage: &StageSpec) -> std::io::Result<StageOutput> {
        let run = stage.args.first().cloned().unwrap_or_default();

        *self.calls.lock().unwrap().entry(stage.name.clone()).or_default() += 1;
        self.calls_by_run
            .lock()
            .unwrap()
            .entry(run.clone())
            .or_default()
            .push(stage.name.clone());

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.panics.iter().any(|(s, r)| *s == stage.name && *r == run) {
            panic!("{} crashed for {}", stage.name, run);
        }

        let fails = self
            .failures
            .iter()
            .any(|(s, r)| *s == stage.name && *r == run);

        if fails {
            Ok(StageOutput::failed(1, "", format!("{} failed for {}", stage.name, run)))
        } else {
            Ok(StageOutput::succeeded(format!("{} done for {}", stage.name, run), ""))
        }
    }
}

/// Plans for runs `0..count` of scene `scene`, each going through `stages`
///
/// Each stage gets the run key as its only argument.
pub fn plans(dir: &Path, scene: &str, count: u32, stages: &[&str]) -> Vec<RunPlan> {
    (0..count)
        .map(|index| {
            let identity = RunIdentity::new(scene, 3, index);
            let key = identity.key();
            RunPlan {
                stages: stages
                    .iter()
                    .map(|name| StageSpec::new(*name, "mock", vec![key.clone()]))
                    .collect(),
                log_path: dir.join(scene).join(format!("run_{}.log", key)),
                identity,
            }
        })
        .collect()
}
