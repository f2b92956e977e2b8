//! Integration tests for the `rlops validate` command.

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

fn make_merged(root: &Path, step: u32) {
    fs::create_dir_all(root.join(format!("global_step_{step}/actor/huggingface"))).unwrap();
}

#[test]
fn test_validate_dry_run_passes_model_path_twice() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("checkpoints");
    make_merged(&root, 40);
    // Unmerged shard is not a validation target.
    fs::create_dir_all(root.join("global_step_20/actor")).unwrap();

    let model = root.join("global_step_40/actor/huggingface").display().to_string();
    rlops(temp.path())
        .args(["validate", "--dry-run", "--root"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{model} {model}")))
        .stdout(predicate::str::contains("global_step_20").not());
}

#[test]
fn test_validate_filter_steps() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("checkpoints");
    make_merged(&root, 10);
    make_merged(&root, 20);
    make_merged(&root, 30);

    rlops(temp.path())
        .args(["validate", "--dry-run", "--filter-steps", "10", "30", "--root"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total to validate: 2"))
        .stdout(predicate::str::contains("not in filter"));
}

#[test]
fn test_validate_streams_program_output() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("checkpoints");
    make_merged(&root, 7);
    fs::write(
        temp.path().join(".rlopsrc"),
        "[validate]\nprogram = [\"sh\", \"-c\", \"echo validating $1\", \"validate\"]\n",
    )
    .unwrap();

    rlops(temp.path())
        .args(["validate", "--root"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("validating "))
        .stdout(predicate::str::contains("All 1 succeeded"));
}

#[test]
fn test_validate_roots_from_config() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("ckpt");
    make_merged(&root, 3);
    fs::write(temp.path().join(".rlopsrc"), format!("checkpoint_roots = [{:?}]\n", root.display().to_string()))
        .unwrap();

    rlops(temp.path())
        .args(["validate", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("global_step_3"));
}

#[test]
fn test_validate_invalid_config_is_reported() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("bad.toml");
    fs::write(&config, "[reward]\nformat_weight = 2.0\n").unwrap();

    rlops(temp.path())
        .arg("--config")
        .arg(&config)
        .args(["validate", "--root", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("format_weight"));
}
