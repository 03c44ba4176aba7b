//! CLI argument validation tests.
//!
//! These tests verify that the CLI properly validates arguments and provides
//! helpful error messages without touching any state.

use predicates::prelude::*;
use tempfile::TempDir;

use super::helpers::{bitmor_cmd, init_world};

#[test]
fn test_help_output() {
    let dir = TempDir::new().unwrap();
    bitmor_cmd(&dir.path().join("state.json"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bitmor"))
        .stdout(predicate::str::contains("pool"))
        .stdout(predicate::str::contains("loan"))
        .stdout(predicate::str::contains("liquidate"));
}

#[test]
fn test_loan_help_output() {
    let dir = TempDir::new().unwrap();
    bitmor_cmd(&dir.path().join("state.json"))
        .args(["loan", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("open"))
        .stdout(predicate::str::contains("repay"))
        .stdout(predicate::str::contains("close"));
}

#[test]
fn test_invalid_command() {
    let dir = TempDir::new().unwrap();
    bitmor_cmd(&dir.path().join("state.json"))
        .arg("invalid_command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_missing_state_file() {
    let dir = TempDir::new().unwrap();
    bitmor_cmd(&dir.path().join("state.json"))
        .args(["reserve", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bitmor init"));
}

#[test]
fn test_faucet_missing_amount() {
    let world = init_world();
    bitmor_cmd(&world.state)
        .args(["faucet", "alice", "--asset", "USDC"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_unknown_asset_rejected() {
    let world = init_world();
    bitmor_cmd(&world.state)
        .args(["faucet", "alice", "--asset", "DOGE", "--amount", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown asset"));
}

#[test]
fn test_malformed_amount_rejected() {
    let world = init_world();
    bitmor_cmd(&world.state)
        .args(["faucet", "alice", "--asset", "USDC", "--amount", "1.2.3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid amount"));
}

#[test]
fn test_advance_requires_duration() {
    let world = init_world();
    bitmor_cmd(&world.state)
        .args(["advance"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--seconds or --days"));
}
