//! Installment loan lifecycle tests through the binary.

use predicates::prelude::*;

use super::helpers::{bitmor_cmd, faucet, init_world, open_reference_loan, seed_liquidity};

#[test]
fn test_loan_open_shows_terms() {
    let world = init_world();
    seed_liquidity(&world);
    let vault = open_reference_loan(&world, 0);

    bitmor_cmd(&world.state)
        .args(["loan", "show", &vault])
        .assert()
        .success()
        .stdout(predicate::str::contains("Active"))
        .stdout(predicate::str::contains("12 months"))
        .stdout(predicate::str::contains("Outstanding debt"));
}

#[test]
fn test_loan_open_without_liquidity_fails() {
    let world = init_world();
    faucet(&world, "alice", "USDC", "40000");

    bitmor_cmd(&world.state)
        .args([
            "loan", "open", "alice", "--deposit", "40000", "--collateral", "1",
            "--months", "12",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Insufficient liquidity"));
}

#[test]
fn test_loan_repay_and_close() {
    let world = init_world();
    seed_liquidity(&world);
    let vault = open_reference_loan(&world, 0);

    // One scheduled installment a month in
    bitmor_cmd(&world.state)
        .args(["advance", "--days", "30"])
        .assert()
        .success();
    faucet(&world, "alice", "USDC", "2000");
    bitmor_cmd(&world.state)
        .args(["loan", "repay", &vault, "--amount", "2000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied"));

    // Early close pays the remainder out in cbBTC
    bitmor_cmd(&world.state)
        .args(["loan", "close", &vault, "--in-collateral"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Closed"));

    bitmor_cmd(&world.state)
        .args(["loan", "show", &vault])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed"));
}

#[test]
fn test_crash_then_liquidation() {
    let world = init_world();
    seed_liquidity(&world);
    let vault = open_reference_loan(&world, 0);

    bitmor_cmd(&world.state)
        .args(["price", "set", "cbBTC", "20000"])
        .assert()
        .success();

    faucet(&world, "liquidator", "USDC", "25000");
    bitmor_cmd(&world.state)
        .args([
            "liquidate", &vault, "--liquidator", "liquidator", "--amount", "20000",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Full liquidation"));

    bitmor_cmd(&world.state)
        .args(["loan", "show", &vault])
        .assert()
        .success()
        .stdout(predicate::str::contains("Liquidated"));
}

#[test]
fn test_insured_loan_resists_full_liquidation() {
    let world = init_world();
    seed_liquidity(&world);
    let vault = open_reference_loan(&world, 7);

    bitmor_cmd(&world.state)
        .args(["price", "set", "cbBTC", "20000"])
        .assert()
        .success();

    faucet(&world, "liquidator", "USDC", "25000");
    bitmor_cmd(&world.state)
        .args([
            "liquidate", &vault, "--liquidator", "liquidator", "--amount", "20000",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("insured"));

    // The bounded slice goes through
    bitmor_cmd(&world.state)
        .args([
            "liquidate", &vault, "--liquidator", "liquidator", "--amount", "1000",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Micro liquidation"))
        .stdout(predicate::str::contains("escrow"));
}

#[test]
fn test_loan_list_table() {
    let world = init_world();
    seed_liquidity(&world);
    open_reference_loan(&world, 0);

    bitmor_cmd(&world.state)
        .args(["loan", "list", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Active"));
}
