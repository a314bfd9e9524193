// ABOUTME: Smoke tests for the railyard binary.
// ABOUTME: Help output, config scaffolding, and failure modes without a config.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_the_rollout_commands() {
    Command::cargo_bin("railyard")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy-all"))
        .stdout(predicate::str::contains("rollback"))
        .stdout(predicate::str::contains("variables"));
}

#[test]
fn init_writes_a_parseable_config() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("railyard")
        .unwrap()
        .current_dir(dir.path())
        .args(["init", "--project", "demo"])
        .assert()
        .success();

    let written = std::fs::read_to_string(dir.path().join("railyard.yml")).unwrap();
    assert!(written.contains("project: demo"));

    // A second init refuses to clobber the file.
    Command::cargo_bin("railyard")
        .unwrap()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn commands_without_a_config_fail_clearly() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("railyard")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("RAILWAY_TOKEN")
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn commands_without_a_credential_fail_clearly() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("railyard")
        .unwrap()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    Command::cargo_bin("railyard")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("RAILWAY_TOKEN")
        .arg("health")
        .assert()
        .failure()
        .stderr(predicate::str::contains("RAILWAY_TOKEN"));
}
