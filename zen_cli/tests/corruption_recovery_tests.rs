//! Corruption recovery tests for the zen binary.
//!
//! These tests verify the system can handle:
//! - Corrupted progress files
//! - Corrupted or torn journal lines
//! - Malformed config files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("zen"));
    cmd.arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn setup_test_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir_all(dir.path().join("data")).unwrap();
    dir
}

#[test]
fn test_corrupted_progress_file() {
    let temp_dir = setup_test_dir();
    let progress_path = temp_dir.path().join("data/progress.json");
    fs::write(&progress_path, "{ invalid json }}}}").expect("Failed to write corrupted progress");

    cli(temp_dir.path())
        .args(["run", "--exercise", "kegel", "--simulate"])
        .assert()
        .success();

    // Rewritten with valid content
    let content = fs::read_to_string(&progress_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed["days"].as_object().unwrap().len(), 1);
}

#[test]
fn test_corrupted_journal_ignored_during_read() {
    let temp_dir = setup_test_dir();
    let journal_path = temp_dir.path().join("data/journal.jsonl");
    fs::write(&journal_path, "{ invalid json }\n{ more invalid }")
        .expect("Failed to write corrupted journal");

    cli(temp_dir.path())
        .arg("progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exercises logged (all time): 0"));
}

#[test]
fn test_partial_journal_line() {
    let temp_dir = setup_test_dir();
    let journal_path = temp_dir.path().join("data/journal.jsonl");

    // Simulate a crash during write: no trailing newline
    let mut file = fs::File::create(&journal_path).unwrap();
    write!(file, r#"{{"id":"partial"#).unwrap();
    drop(file);

    cli(temp_dir.path())
        .args(["run", "--exercise", "kegel", "--simulate"])
        .assert()
        .success();

    // The torn line is skipped, the new record is not
    cli(temp_dir.path())
        .arg("progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exercises logged (all time): 1"));
}

#[test]
fn test_malformed_config_reports_error() {
    let temp_dir = setup_test_dir();
    fs::write(temp_dir.path().join("config.toml"), "[exercises.kegel\nrounds = ").unwrap();

    cli(temp_dir.path())
        .args(["run", "--simulate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Toml"));
}

#[test]
fn test_missing_data_dir_is_created() {
    let temp_dir = tempfile::tempdir().unwrap();

    cli(temp_dir.path())
        .args(["run", "--exercise", "kegel", "--simulate"])
        .assert()
        .success();

    assert!(temp_dir.path().join("data/journal.jsonl").exists());
    assert!(temp_dir.path().join("data/progress.json").exists());
}
