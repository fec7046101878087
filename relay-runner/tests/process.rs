//! Runs against real child processes

#![cfg(unix)]

mod common;

use common::TempDir;
use relay_core::domain::identity::RunIdentity;
use relay_core::domain::plan::RunPlan;
use relay_core::domain::result::PipelineStatus;
use relay_core::domain::stage::StageSpec;
use relay_runner::{Config, Dispatcher, StandardStageLauncher};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn sh(name: &str, script: &str) -> StageSpec {
    StageSpec::new(name, "sh", vec!["-c".to_string(), script.to_string()])
}

fn plan(dir: &Path, index: u32, stages: Vec<StageSpec>) -> RunPlan {
    let identity = RunIdentity::new("proc", 1, index);
    RunPlan {
        log_path: dir.join(format!("run_{}.log", identity.key())),
        identity,
        stages,
    }
}

fn dispatcher(config: Config) -> Dispatcher {
    Dispatcher::new(config, Arc::new(StandardStageLauncher::new())).unwrap()
}

#[tokio::test]
async fn test_log_layout_with_failing_stage() {
    let dir = TempDir::new();
    let stages = vec![
        sh("Train", "echo trained; echo warming up >&2"),
        sh("Render", "echo partial frames; echo render exploded >&2; exit 3"),
        sh("Eval", "echo never"),
    ];

    let report = dispatcher(Config::new(1))
        .dispatch(vec![plan(dir.path(), 0, stages)])
        .await
        .unwrap();

    let result = &report.results()[0];
    assert_eq!(
        result.status,
        PipelineStatus::StageFailed {
            stage: "Render".to_string(),
            exit_code: Some(3),
            stderr_tail: "render exploded".to_string(),
        }
    );

    let log = std::fs::read_to_string(&result.log_path).unwrap();
    let expected = "Executing: sh -c 'echo trained; echo warming up >&2'\n\n\
                    --- Train Output ---\ntrained\n\n\
                    --- Train Error ---\nwarming up\n\n\
                    --- Train Complete ---\n\n\
                    Executing: sh -c 'echo partial frames; echo render exploded >&2; exit 3'\n\n\
                    \n\n!!! ERROR !!!\n\
                    Command: sh -c 'echo partial frames; echo render exploded >&2; exit 3'\n\
                    Return Code: 3\n\
                    Output:\npartial frames\n\n\
                    Stderr:\nrender exploded\n\n";
    assert_eq!(log, expected);
}

#[tokio::test]
async fn test_successful_run_log() {
    let dir = TempDir::new();
    let stages = vec![sh("Train", "echo a"), sh("Render", "echo b"), sh("Eval", "echo c")];

    let report = dispatcher(Config::new(2))
        .dispatch(vec![plan(dir.path(), 0, stages)])
        .await
        .unwrap();

    assert!(report.all_succeeded());
    let log = std::fs::read_to_string(&report.results()[0].log_path).unwrap();

    let positions: Vec<usize> = [
        "--- Train Output ---",
        "--- Train Complete ---",
        "--- Render Output ---",
        "--- Render Complete ---",
        "--- Eval Output ---",
        "--- Eval Complete ---",
    ]
    .iter()
    .map(|marker| log.find(marker).expect(marker))
    .collect();

    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert!(!log.contains("!!!"));
}

#[tokio::test]
async fn test_missing_program_is_unexpected_error() {
    let dir = TempDir::new();
    let stages = vec![
        sh("Train", "echo ok"),
        StageSpec::new("Render", "relay-no-such-program-xyz", vec![]),
    ];

    let report = dispatcher(Config::new(1))
        .dispatch(vec![plan(dir.path(), 0, stages)])
        .await
        .unwrap();

    let result = &report.results()[0];
    assert_eq!(result.summary_line(), "Unexpected Error in proc_1_0");

    let log = std::fs::read_to_string(&result.log_path).unwrap();
    assert!(log.contains("--- Train Complete ---"));
    assert!(log.contains("!!! UNEXPECTED ERROR: Failed to launch stage Render"));
}

#[tokio::test]
async fn test_stage_timeout_kills_process() {
    let dir = TempDir::new();
    let stages = vec![sh("Train", "sleep 10"), sh("Render", "echo never")];
    let config = Config::new(1).with_stage_timeout(Duration::from_millis(200));

    let started = Instant::now();
    let report = dispatcher(config)
        .dispatch(vec![plan(dir.path(), 0, stages)])
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));

    let result = &report.results()[0];
    assert_eq!(
        result.status,
        PipelineStatus::TimedOut {
            stage: "Train".to_string(),
            timeout: Duration::from_millis(200),
        }
    );

    let log = std::fs::read_to_string(&result.log_path).unwrap();
    assert!(log.contains("!!! TIMEOUT !!!"));
    assert!(!log.contains("Render"));
}

#[tokio::test]
async fn test_mixed_batch_with_real_processes() {
    let dir = TempDir::new();
    let plans = (0..4)
        .map(|index| {
            let script = if index == 2 { "exit 1" } else { "true" };
            plan(dir.path(), index, vec![sh("Train", "true"), sh("Eval", script)])
        })
        .collect();

    let report = dispatcher(Config::new(2)).dispatch(plans).await.unwrap();

    assert_eq!(
        report.summary_lines(),
        vec![
            "Success for proc_1_0",
            "Success for proc_1_1",
            "Error in proc_1_2",
            "Success for proc_1_3",
        ]
    );
}
