//! Integration tests for the zen binary.
//!
//! These tests verify end-to-end behavior including:
//! - Simulated exercise runs
//! - Journal and progress recording
//! - Configuration loading and validation

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the CLI with an isolated config path
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zen"));
    cmd.arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn read_progress(dir: &Path) -> Value {
    let content =
        fs::read_to_string(dir.join("data/progress.json")).expect("Failed to read progress");
    serde_json::from_str(&content).expect("progress is valid JSON")
}

fn journal_lines(dir: &Path) -> Vec<Value> {
    fs::read_to_string(dir.join("data/journal.jsonl"))
        .expect("Failed to read journal")
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("journal line is valid JSON"))
        .collect()
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(temp_dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Guided kegel"));
}

#[test]
fn test_single_exercise_run_records_progress() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["run", "--exercise", "box-breathing", "--simulate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hold Exhale"))
        .stdout(predicate::str::contains("Box Breathing complete"))
        .stdout(predicate::str::contains("1/1 exercises completed"));

    let records = journal_lines(temp_dir.path());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["kind"], "box_breathing");
    assert_eq!(records[0]["rounds"], 4);
    assert_eq!(records[0]["duration_seconds"], 64.0);

    let progress = read_progress(temp_dir.path());
    let days = progress["days"].as_object().expect("days map");
    assert_eq!(days.len(), 1);
    let completed = days.values().next().unwrap()["completed"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(completed, vec![Value::from("box_breathing")]);
}

#[test]
fn test_full_session_runs_configured_order() {
    let temp_dir = setup_test_dir();
    fs::write(
        temp_dir.path().join("config.toml"),
        r#"
[exercises.kegel]
contract_seconds = 1.0
relax_seconds = 1.0
rounds = 2

[exercises.meditation]
duration_minutes = 0.1
"#,
    )
    .unwrap();

    cli(temp_dir.path())
        .args(["run", "--simulate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3/3 exercises completed"))
        .stdout(predicate::str::contains("Today's progress: 100%"));

    let kinds: Vec<_> = journal_lines(temp_dir.path())
        .iter()
        .map(|r| r["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, vec!["kegel", "box_breathing", "meditation"]);
}

#[test]
fn test_no_record_leaves_data_dir_untouched() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["run", "--exercise", "kegel", "--simulate", "--no-record"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kegel Exercise complete"));

    assert!(!temp_dir.path().join("data").exists());
}

#[test]
fn test_invalid_config_prevents_start() {
    let temp_dir = setup_test_dir();
    fs::write(
        temp_dir.path().join("config.toml"),
        "[exercises.kegel]\nrounds = 0\n",
    )
    .unwrap();

    cli(temp_dir.path())
        .args(["run", "--exercise", "meditation", "--simulate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs at least one round"));

    assert!(!temp_dir.path().join("data/journal.jsonl").exists());
}

#[test]
fn test_unknown_exercise_rejected() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["run", "--exercise", "yoga", "--simulate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown exercise"));
}

#[test]
fn test_progress_reports_today() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["run", "--exercise", "kegel", "--simulate"])
        .assert()
        .success();

    cli(temp_dir.path())
        .arg("progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] Kegel Exercise"))
        .stdout(predicate::str::contains("[ ] Meditation"))
        .stdout(predicate::str::contains("1/3 exercises (33%)"))
        .stdout(predicate::str::contains("Exercises logged (all time): 1"));
}

#[test]
fn test_progress_rejects_bad_month() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["progress", "--month", "2024-13"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected YYYY-MM"));
}

#[test]
fn test_config_init_writes_defaults() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");

    cli(temp_dir.path())
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[exercises.kegel]"))
        .stdout(predicate::str::contains("Wrote default config"));

    let written = fs::read_to_string(&config_path).unwrap();
    assert!(written.contains("contract_seconds = 5.0"));

    cli(temp_dir.path())
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}
