//! Persistent world state for the CLI.
//!
//! The whole protocol lives in one JSON file: the engine state, the
//! reference swap venue, and a logical clock. Commands load the file,
//! run one engine operation, and write the file back. The clock only
//! moves via `advance`, which keeps every run reproducible.

use std::path::Path;

use alloy_primitives::{keccak256, Address, U256};
use anyhow::{anyhow, bail, Context, Result};
use bitmor_rs_engine::{OraclePricedVenue, Protocol};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct World {
    pub protocol: Protocol,
    pub venue: OraclePricedVenue,
    /// Logical unix time; every engine call is stamped with it
    pub clock: u64,
}

impl World {
    pub fn new(clock: u64, venue_slippage_bps: u64) -> Self {
        Self {
            protocol: Protocol::new(),
            venue: OraclePricedVenue::new(venue_slippage_bps),
            clock,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("no state file at {} (run `bitmor init` first)", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("corrupt state file at {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("failed to write state file {}", path.display()))?;
        Ok(())
    }

    /// Resolves an asset argument: a reserve symbol (case-insensitive) or
    /// a hex address.
    pub fn resolve_asset(&self, input: &str) -> Result<Address> {
        for reserve in self.protocol.reserves.values() {
            if reserve.symbol.eq_ignore_ascii_case(input) {
                return Ok(reserve.asset);
            }
        }
        input
            .parse::<Address>()
            .map_err(|_| anyhow!("unknown asset {input:?}: not a reserve symbol or hex address"))
    }

    pub fn reserve_decimals(&self, asset: Address) -> Result<u32> {
        self.protocol
            .reserves
            .get(&asset)
            .map(|r| r.config.decimals)
            .ok_or_else(|| anyhow!("no reserve for asset {asset}"))
    }

    pub fn reserve_symbol(&self, asset: Address) -> String {
        self.protocol
            .reserves
            .get(&asset)
            .map(|r| r.symbol.clone())
            .unwrap_or_else(|| format!("{asset}"))
    }
}

/// Resolves an account argument: a hex address, or a human alias hashed
/// into a deterministic address.
pub fn resolve_account(input: &str) -> Address {
    if let Ok(address) = input.parse::<Address>() {
        return address;
    }
    Address::from_slice(&keccak256(input.as_bytes())[12..])
}

/// Parses a human-readable decimal amount into token base units.
pub fn parse_amount(input: &str, decimals: u32) -> Result<U256> {
    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        bail!("empty amount");
    }
    if frac.len() > decimals as usize {
        bail!("amount {input:?} has more than {decimals} decimal places");
    }
    let whole: U256 = if whole.is_empty() {
        U256::ZERO
    } else {
        whole
            .parse()
            .map_err(|_| anyhow!("invalid amount {input:?}"))?
    };
    let mut frac_units = U256::ZERO;
    if !frac.is_empty() {
        let parsed: U256 = frac
            .parse()
            .map_err(|_| anyhow!("invalid amount {input:?}"))?;
        let shift = decimals as usize - frac.len();
        frac_units = parsed * U256::from(10u64).pow(U256::from(shift));
    }
    Ok(whole * U256::from(10u64).pow(U256::from(decimals)) + frac_units)
}

/// Formats token base units back into a human-readable decimal string.
pub fn format_amount(amount: U256, decimals: u32) -> String {
    let scale = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / scale;
    let frac = amount % scale;
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{frac:0>width$}", width = decimals as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Parses a whole-dollar price into the oracle's USD-8 representation.
pub fn parse_usd_price(input: &str) -> Result<U256> {
    parse_amount(input, bitmor_rs_engine::PRICE_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_whole_and_fractional() {
        assert_eq!(parse_amount("100", 6).unwrap(), U256::from(100_000_000u64));
        assert_eq!(parse_amount("100.5", 6).unwrap(), U256::from(100_500_000u64));
        assert_eq!(parse_amount("0.000001", 6).unwrap(), U256::from(1u64));
        assert_eq!(parse_amount(".5", 8).unwrap(), U256::from(50_000_000u64));
    }

    #[test]
    fn test_parse_amount_rejects_excess_precision() {
        assert!(parse_amount("1.0000001", 6).is_err());
        assert!(parse_amount("abc", 6).is_err());
        assert!(parse_amount("", 6).is_err());
    }

    #[test]
    fn test_format_amount_round_trips() {
        assert_eq!(format_amount(U256::from(100_500_000u64), 6), "100.5");
        assert_eq!(format_amount(U256::from(100_000_000u64), 6), "100");
        assert_eq!(format_amount(U256::from(1u64), 8), "0.00000001");
    }

    #[test]
    fn test_resolve_account_aliases_are_stable() {
        let alice = resolve_account("alice");
        assert_eq!(alice, resolve_account("alice"));
        assert_ne!(alice, resolve_account("bob"));

        let hex = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
        assert_eq!(
            resolve_account(hex),
            hex.parse::<Address>().unwrap()
        );
    }
}
