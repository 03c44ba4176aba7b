//! Test helper utilities for CLI integration tests.

#![allow(deprecated)] // Command::cargo_bin deprecation

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A throwaway state file inside its own temp directory.
pub struct TestWorld {
    _dir: TempDir,
    pub state: PathBuf,
}

/// Create a CLI command bound to a state file.
pub fn bitmor_cmd(state: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bitmor").unwrap();
    cmd.env("BITMOR_STATE", state);
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Initialize a fresh protocol state in a temp directory.
pub fn init_world() -> TestWorld {
    let dir = TempDir::new().unwrap();
    let state = dir.path().join("state.json");
    bitmor_cmd(&state).arg("init").assert().success();
    TestWorld { _dir: dir, state }
}

/// Mint tokens to an account (with a pool approval).
pub fn faucet(world: &TestWorld, account: &str, asset: &str, amount: &str) {
    bitmor_cmd(&world.state)
        .args(["faucet", account, "--asset", asset, "--amount", amount])
        .assert()
        .success();
}

/// Seed the pool with 1M USDC of supplier liquidity.
pub fn seed_liquidity(world: &TestWorld) {
    faucet(world, "lp", "USDC", "1000000");
    bitmor_cmd(&world.state)
        .args(["pool", "deposit", "lp", "--asset", "USDC", "--amount", "1000000"])
        .assert()
        .success();
}

/// Open the reference loan (40k down on 1 cbBTC over 12 months) and
/// return its vault address.
pub fn open_reference_loan(world: &TestWorld, insurance_id: u64) -> String {
    faucet(world, "alice", "USDC", "40000");
    bitmor_cmd(&world.state)
        .args([
            "loan",
            "open",
            "alice",
            "--deposit",
            "40000",
            "--collateral",
            "1",
            "--months",
            "12",
            "--insurance-id",
            &insurance_id.to_string(),
        ])
        .assert()
        .success();
    vault_of(world, "alice")
}

/// Look up a borrower's latest vault address through the JSON output.
pub fn vault_of(world: &TestWorld, borrower: &str) -> String {
    let output = bitmor_cmd(&world.state)
        .args(["loan", "list", borrower, "--format", "json"])
        .output()
        .unwrap();
    let loans: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    loans
        .as_array()
        .unwrap()
        .last()
        .unwrap()
        .get("vault")
        .unwrap()
        .as_str()
        .unwrap()
        .to_string()
}
