//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against an isolated data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

const TASKS: &str = r#"[
  {"id": "t1", "name": "Quarterly report", "priority": "high", "status": "in_progress",
   "createdAt": "2024-06-03T09:15:00Z"},
  {"id": "t2", "name": "Inbox zero", "priority": "low", "status": "completed",
   "createdAt": "2024-06-03T14:40:00Z"}
]"#;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_taskpulse"))
        .env("TASKPULSE_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tasks.json"), TASKS).unwrap();
    dir
}

#[test]
fn test_status_when_idle() {
    let dir = workspace();
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["phase"]["phase"], "idle");
    assert_eq!(status["state"]["remaining_seconds"], 1500);
    assert_eq!(status["remaining"], "25:00");
    assert_eq!(status["progress"], 0.0);
}

#[test]
fn test_start_unknown_task_fails() {
    let dir = workspace();
    let (_, stderr, code) = run_cli(dir.path(), &["timer", "start", "ghost"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Unknown task: ghost"), "{stderr}");
}

#[test]
fn test_work_session_is_recorded() {
    let dir = workspace();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "set", "timer.work_duration", "1"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let started = run_json(dir.path(), &["timer", "start", "t1"]);
    assert_eq!(started["events"][0]["type"], "timer_started");
    assert_eq!(started["state"]["remaining_seconds"], 60);

    let ticked = run_json(dir.path(), &["timer", "tick", "--seconds", "30"]);
    assert_eq!(ticked["state"]["remaining_seconds"], 30);
    assert_eq!(ticked["progress"], 0.5);

    let ticked = run_json(dir.path(), &["timer", "tick", "--seconds", "30"]);
    assert_eq!(ticked["events"][0]["type"], "work_session_completed");
    assert_eq!(ticked["phase"]["phase"], "running");
    assert_eq!(ticked["phase"]["mode"], "break");

    let ledger = run_json(dir.path(), &["ledger", "show", "t1"]);
    assert_eq!(ledger["time_spent"]["total"], 1);
    assert_eq!(ledger["productivity"]["sessions"].as_array().unwrap().len(), 1);
}

#[test]
fn test_stop_with_progress() {
    let dir = workspace();
    run_json(dir.path(), &["timer", "start", "t1"]);
    run_json(dir.path(), &["timer", "tick", "--seconds", "120"]);
    let stopped = run_json(
        dir.path(),
        &["timer", "stop", "--progress", "150", "--description", "draft"],
    );
    assert_eq!(stopped["events"][0]["type"], "timer_stopped");
    assert_eq!(stopped["events"][0]["elapsed_minutes"], 2);
    assert_eq!(stopped["events"][0]["progress"], 100);
    assert_eq!(stopped["phase"]["phase"], "idle");

    let ledger = run_json(dir.path(), &["ledger", "show", "t1"]);
    assert_eq!(ledger["time_spent"]["sessions"][0]["description"], "draft");
}

#[test]
fn test_rank_json_presets() {
    let dir = workspace();
    let ranked = run_json(dir.path(), &["rank", "--json"]);
    assert_eq!(ranked["important"][0]["task_id"], "t1");
    assert_eq!(ranked["important"][0]["score"], 65);
    assert_eq!(ranked["optional"][0]["score"], -5);

    let ranked = run_json(dir.path(), &["rank", "--json", "--preset", "dashboard"]);
    assert_eq!(ranked["optional"][0]["score"], -20);
}

#[test]
fn test_insights_cold_start() {
    let dir = workspace();
    let report = run_json(dir.path(), &["insights"]);
    assert_eq!(report["cold_start"], true);
    assert_eq!(report["peak_hours"], serde_json::json!([14, 9]));
    assert_eq!(report["optimal_duration_minutes"], 25);
}

#[test]
fn test_config_get_and_unknown_key() {
    let dir = workspace();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "timer.break_duration"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");

    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("timer.nope"));
}

#[test]
fn test_explicit_missing_task_file_fails() {
    let dir = workspace();
    let missing = dir.path().join("nope.json");
    let (_, stderr, code) = run_cli(
        dir.path(),
        &["--tasks", missing.to_str().unwrap(), "timer", "status"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("cannot read"));
}

#[test]
fn test_unopenable_store_runs_in_memory() {
    let dir = workspace();
    std::fs::create_dir(dir.path().join("taskpulse.db")).unwrap();

    let (stdout, stderr, code) = run_cli(dir.path(), &["timer", "status"]);
    assert_eq!(code, 0, "{stderr}");
    assert!(stderr.contains("store unavailable"), "{stderr}");
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(status["phase"]["phase"], "idle");
    assert_eq!(status["state"]["remaining_seconds"], 1500);

    let started = run_json(dir.path(), &["timer", "start", "t1"]);
    assert_eq!(started["events"][0]["type"], "timer_started");
}

#[test]
fn test_malformed_config_falls_back_to_defaults() {
    let dir = workspace();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "[timer").unwrap();

    let (stdout, stderr, code) = run_cli(dir.path(), &["rank", "--json"]);
    assert_eq!(code, 0, "{stderr}");
    assert!(stderr.contains("config unavailable"), "{stderr}");
    let ranked: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(ranked["important"][0]["score"], 65);

    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["state"]["remaining_seconds"], 1500);

    // Writes still refuse to clobber a file they cannot parse.
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "timer.work_duration", "10"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Failed to parse configuration"), "{stderr}");
    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), "[timer");
}

#[test]
fn test_ledger_progress_is_keyed_by_session() {
    let dir = workspace();
    run_json(dir.path(), &["timer", "start", "t1"]);
    run_json(dir.path(), &["timer", "stop", "--progress", "40"]);

    let ledger = run_json(dir.path(), &["ledger", "show", "t1"]);
    let progress = ledger["progress"].as_object().unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress.values().next().unwrap(), 40);
}
