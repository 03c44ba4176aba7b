//! Money market command tests against real state files.

use predicates::prelude::*;

use super::helpers::{bitmor_cmd, faucet, init_world, seed_liquidity};

#[test]
fn test_init_creates_both_reserves() {
    let world = init_world();
    bitmor_cmd(&world.state)
        .args(["reserve", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("USDC"))
        .stdout(predicate::str::contains("cbBTC"));
}

#[test]
fn test_deposit_and_withdraw() {
    let world = init_world();
    faucet(&world, "alice", "USDC", "1000");

    bitmor_cmd(&world.state)
        .args(["pool", "deposit", "alice", "--asset", "USDC", "--amount", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deposited"));

    bitmor_cmd(&world.state)
        .args(["pool", "withdraw", "alice", "--asset", "USDC", "--amount", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Withdrew 1000 USDC"));
}

#[test]
fn test_borrow_against_collateral() {
    let world = init_world();
    seed_liquidity(&world);
    faucet(&world, "bob", "cbBTC", "1");

    bitmor_cmd(&world.state)
        .args(["pool", "deposit", "bob", "--asset", "cbBTC", "--amount", "1"])
        .assert()
        .success();

    bitmor_cmd(&world.state)
        .args(["pool", "borrow", "bob", "--asset", "USDC", "--amount", "10000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Borrowed"));

    // Health factor is visible and comfortable
    bitmor_cmd(&world.state)
        .args(["account", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Health factor"));

    faucet(&world, "bob", "USDC", "10000");
    bitmor_cmd(&world.state)
        .args(["pool", "repay", "bob", "--asset", "USDC", "--amount", "10000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Repaid 10000 USDC"));
}

#[test]
fn test_borrow_without_collateral_fails() {
    let world = init_world();
    seed_liquidity(&world);

    bitmor_cmd(&world.state)
        .args(["pool", "borrow", "mallory", "--asset", "USDC", "--amount", "100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Collateral cannot cover"));
}

#[test]
fn test_failed_command_leaves_state_intact() {
    let world = init_world();
    faucet(&world, "alice", "USDC", "1000");
    bitmor_cmd(&world.state)
        .args(["pool", "deposit", "alice", "--asset", "USDC", "--amount", "1000"])
        .assert()
        .success();

    let before = std::fs::read_to_string(&world.state).unwrap();
    bitmor_cmd(&world.state)
        .args(["pool", "withdraw", "alice", "--asset", "USDC", "--amount", "5000"])
        .assert()
        .failure();
    let after = std::fs::read_to_string(&world.state).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_interest_accrues_after_advance() {
    let world = init_world();
    seed_liquidity(&world);
    faucet(&world, "bob", "cbBTC", "10");
    bitmor_cmd(&world.state)
        .args(["pool", "deposit", "bob", "--asset", "cbBTC", "--amount", "10"])
        .assert()
        .success();
    bitmor_cmd(&world.state)
        .args(["pool", "borrow", "bob", "--asset", "USDC", "--amount", "200000"])
        .assert()
        .success();

    bitmor_cmd(&world.state)
        .args(["advance", "--days", "365"])
        .assert()
        .success();

    // A year of utilization shows a nonzero borrow index
    let output = bitmor_cmd(&world.state)
        .args(["reserve", "show", "USDC", "--format", "json"])
        .output()
        .unwrap();
    let reserve: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(reserve.get("current_variable_borrow_rate").is_some());
}

#[test]
fn test_reserve_list_json_format() {
    let world = init_world();
    let output = bitmor_cmd(&world.state)
        .args(["reserve", "list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let reserves: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reserves.as_array().unwrap().len(), 2);
}
