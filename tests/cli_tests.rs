mod common;

use common::*;
use std::process::Command;

fn cli_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_timeline-sync"))
}

#[test]
fn test_cli_help() {
    let output = cli_command().arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Follow the step-by-step status of a running workflow"));
    assert!(stdout.contains("watch"));
    assert!(stdout.contains("render"));
    assert!(stdout.contains("validate"));
}

#[test]
fn test_cli_version() {
    let output = cli_command().arg("--version").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("timeline-sync"));
}

#[test]
fn test_cli_watch_help() {
    let output = cli_command().args(["watch", "--help"]).output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Watch a workflow timeline live"));
    assert!(stdout.contains("--task-id"));
    assert!(stdout.contains("--snapshot"));
    assert!(stdout.contains("--exit-on-finish"));
}

#[test]
fn test_cli_validate_config() {
    let dir = create_test_dir();
    write_file(dir.path(), "timeline.yaml", &timeline_config("task-1"));

    let output = cli_command()
        .args(["validate", dir.path().join("timeline.yaml").to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("is valid"));
    assert!(stdout.contains("4 steps"));
    assert!(stdout.contains(LAST_STEP));
}

#[test]
fn test_cli_validate_invalid_config() {
    let dir = create_test_dir();
    write_file(dir.path(), "timeline.yaml", "timeline:\n  steps: []\n");

    let output = cli_command()
        .args(["validate", dir.path().join("timeline.yaml").to_str().unwrap()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_validate_missing_file() {
    let output = cli_command()
        .args(["validate", "/nonexistent/timeline.yaml"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Config file not found"));
}

#[test]
fn test_cli_render_snapshot_and_events() {
    let dir = create_test_dir();
    write_file(dir.path(), "timeline.yaml", &timeline_config("task-1"));
    write_file(
        dir.path(),
        "snapshot.json",
        &format!(r#"{{"{}": {{"status": "success"}}}}"#, upload_step()),
    );
    write_file(
        dir.path(),
        "events.jsonl",
        &format!(
            "{}\nnot json\n{}\n{}\n",
            format_args!(r#"{{"step_id": "{}", "status": "success", "message": "Output: {{\"rows\": 3}}"}}"#, clean_step()),
            format_args!(r#"{{"step_id": "unknown", "status": "running"}}"#),
            format_args!(r#"{{"step_id": "{}", "status": "success"}}"#, LAST_STEP),
        ),
    );

    let output = cli_command()
        .args([
            "render",
            "--config",
            dir.path().join("timeline.yaml").to_str().unwrap(),
            "--snapshot",
            dir.path().join("snapshot.json").to_str().unwrap(),
            "--events",
            dir.path().join("events.jsonl").to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Task: task-1"));
    assert!(stdout.contains("\"rows\": 3"));
    assert!(stdout.contains("All steps completed successfully."));
    assert!(stdout.contains("Overall: success"));
    assert!(stdout.contains("Task status: SUCCESS"));
}

#[test]
fn test_cli_render_failed_workflow() {
    let dir = create_test_dir();
    write_file(dir.path(), "timeline.yaml", &timeline_config("task-1"));
    write_file(
        dir.path(),
        "events.jsonl",
        &format!(r#"{{"step_id": "{}", "status": "fail", "message": "bad csv"}}"#, upload_step()),
    );

    let output = cli_command()
        .args([
            "render",
            "--config",
            dir.path().join("timeline.yaml").to_str().unwrap(),
            "--events",
            dir.path().join("events.jsonl").to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Workflow failed at one of the steps."));
    assert!(stdout.contains("Task status: FAILURE"));
}

#[test]
fn test_cli_render_missing_snapshot_is_not_fatal() {
    let dir = create_test_dir();
    write_file(dir.path(), "timeline.yaml", &timeline_config("task-1"));

    let output = cli_command()
        .args([
            "render",
            "--config",
            dir.path().join("timeline.yaml").to_str().unwrap(),
            "--snapshot",
            dir.path().join("missing.json").to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Overall: in progress"));
}

#[test]
fn test_cli_render_missing_task_id() {
    let dir = create_test_dir();
    write_file(
        dir.path(),
        "timeline.yaml",
        "timeline:\n  steps:\n    - id: a\n",
    );

    let output = cli_command()
        .args([
            "render",
            "--config",
            dir.path().join("timeline.yaml").to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Task ID not found"));
}
