//! Concurrency tests for the zen binary.
//!
//! These tests verify that several `zen` processes can safely:
//! - Append to the journal at the same time (file locking)
//! - Record different exercises on the same day without losing any
//! - Read progress while another process writes it

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin!("zen").to_path_buf()
}

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(bin());
    cmd.arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn setup_test_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(
        dir.path().join("config.toml"),
        "[exercises.kegel]\ncontract_seconds = 0.5\nrelax_seconds = 0.5\nrounds = 1\n\n\
         [exercises.box_breathing]\ninhale_seconds = 0.5\nhold_inhale_seconds = 0.5\n\
         exhale_seconds = 0.5\nhold_exhale_seconds = 0.5\nrounds = 1\n\n\
         [exercises.meditation]\nduration_minutes = 0.01\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_concurrent_journal_appends() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let dir = dir.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(i * 5));
                cli(&dir)
                    .args(["run", "--exercise", "kegel", "--simulate"])
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let journal = fs::read_to_string(dir.join("data/journal.jsonl")).expect("Failed to read journal");
    let lines: Vec<_> = journal.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 5, "Expected 5 records, got {}", lines.len());
    for line in lines {
        serde_json::from_str::<serde_json::Value>(line).expect("no interleaved lines");
    }
}

#[test]
fn test_concurrent_runs_record_every_kind() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = ["kegel", "box-breathing", "meditation"]
        .into_iter()
        .map(|kind| {
            let dir = dir.clone();
            thread::spawn(move || {
                for _ in 0..3 {
                    cli(&dir)
                        .args(["run", "--exercise", kind, "--simulate"])
                        .assert()
                        .success();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }

    cli(&dir)
        .arg("progress")
        .assert()
        .success()
        .stdout(predicates::str::contains("3/3 exercises (100%)"))
        .stdout(predicates::str::contains("Exercises logged (all time): 9"));
}

#[test]
fn test_reads_during_writes() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path().to_path_buf();

    cli(&dir)
        .args(["run", "--exercise", "kegel", "--simulate"])
        .assert()
        .success();

    let writer_dir = dir.clone();
    let writer = thread::spawn(move || {
        for _ in 0..3 {
            cli(&writer_dir)
                .args(["run", "--exercise", "kegel", "--simulate"])
                .assert()
                .success();
        }
    });

    for _ in 0..3 {
        cli(&dir).arg("progress").assert().success();
    }

    writer.join().expect("writer panicked");

    let progress = fs::read_to_string(dir.join("data/progress.json")).unwrap();
    serde_json::from_str::<serde_json::Value>(&progress).expect("progress stays valid JSON");
}
