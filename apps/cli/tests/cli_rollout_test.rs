//! Integration tests for the `rlops rollout` command.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn rlops(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rlops").unwrap();
    cmd.current_dir(dir).env("HOME", dir).arg("--log-level").arg("warn");
    cmd
}

#[test]
fn test_rollout_describes_fields() {
    let temp = TempDir::new().unwrap();
    let batch = temp.path().join("batch.json");
    fs::write(&batch, r#"{"input_ids": [[1, 2, 3], [4, 5, 6]], "rewards": [0.5, 1.0]}"#).unwrap();

    rlops(temp.path())
        .arg("rollout")
        .arg(&batch)
        .assert()
        .success()
        .stdout(predicate::str::contains("input_ids"))
        .stdout(predicate::str::contains("int64"))
        .stdout(predicate::str::contains("[2, 3]"))
        .stdout(predicate::str::contains("float64"))
        .stdout(predicate::str::contains("Batch size: 2"));
}

#[test]
fn test_rollout_unwraps_object_array() {
    let temp = TempDir::new().unwrap();
    let batch = temp.path().join("batch.json");
    fs::write(&batch, r#"[{"mask": [true, false, true]}]"#).unwrap();

    rlops(temp.path())
        .arg("rollout")
        .arg(&batch)
        .assert()
        .success()
        .stdout(predicate::str::contains("bool"))
        .stdout(predicate::str::contains("[3]"));
}

#[test]
fn test_rollout_rejects_numeric_array() {
    let temp = TempDir::new().unwrap();
    let batch = temp.path().join("batch.json");
    fs::write(&batch, "[1.0, 2.0]").unwrap();

    rlops(temp.path())
        .arg("rollout")
        .arg(&batch)
        .assert()
        .failure()
        .stderr(predicate::str::contains("dtype float64"));
}

#[test]
fn test_rollout_rejects_ragged_field() {
    let temp = TempDir::new().unwrap();
    let batch = temp.path().join("batch.json");
    fs::write(&batch, r#"{"ids": [[1, 2], [3]]}"#).unwrap();

    rlops(temp.path())
        .arg("rollout")
        .arg(&batch)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ragged"));
}
