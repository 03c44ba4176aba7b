//! State administration: init, faucet, prices, and the logical clock.

use std::path::Path;

use alloy_primitives::{Address, U256};
use anyhow::{bail, Result};
use bitmor_rs_engine::{DefaultRateStrategy, ReserveConfig, PRICE_DECIMALS};
use colored::Colorize;

use crate::cli::{AdvanceArgs, FaucetArgs, InitArgs, PriceSetArgs};
use crate::state::{parse_amount, parse_usd_price, resolve_account, World};

/// Reserve asset addresses are fixed so state files are portable.
pub const USDC_ASSET: Address = Address::repeat_byte(0xA1);
pub const CBBTC_ASSET: Address = Address::repeat_byte(0xB1);

pub fn run_init(args: &InitArgs, state_path: &Path) -> Result<()> {
    let mut world = World::new(args.genesis, args.venue_slippage_bps);

    world.protocol.init_reserve(
        USDC_ASSET,
        "USDC",
        ReserveConfig::usdc(),
        DefaultRateStrategy::usdc(),
        args.genesis,
    );
    world.protocol.init_reserve(
        CBBTC_ASSET,
        "cbBTC",
        ReserveConfig::cbbtc(),
        DefaultRateStrategy::cbbtc(),
        args.genesis,
    );

    let usd_one = U256::from(10u64).pow(U256::from(PRICE_DECIMALS));
    let btc_price = parse_usd_price(&args.btc_price)?;
    world.protocol.oracle.set_price(USDC_ASSET, usd_one);
    world.protocol.oracle.set_price(CBBTC_ASSET, btc_price);

    world.venue = world
        .venue
        .clone()
        .with_asset(USDC_ASSET, usd_one, 6)
        .with_asset(CBBTC_ASSET, btc_price, 8);

    world.save(state_path)?;
    println!(
        "{} protocol state at {}",
        "Initialized".green().bold(),
        state_path.display()
    );
    Ok(())
}

pub fn run_faucet(args: &FaucetArgs, state_path: &Path) -> Result<()> {
    let mut world = World::load(state_path)?;
    let account = resolve_account(&args.account);
    let asset = world.resolve_asset(&args.asset)?;
    let amount = parse_amount(&args.amount, world.reserve_decimals(asset)?)?;

    world.protocol.ledger.mint(asset, account, amount);
    // Blanket approval keeps the console ergonomic; real deployments
    // would scope this per operation
    world
        .protocol
        .ledger
        .approve(asset, account, world.protocol.pool_account, U256::MAX);

    world.save(state_path)?;
    println!(
        "Minted {} {} to {account}",
        args.amount,
        world.reserve_symbol(asset)
    );
    Ok(())
}

pub fn run_price_set(args: &PriceSetArgs, state_path: &Path) -> Result<()> {
    let mut world = World::load(state_path)?;
    let asset = world.resolve_asset(&args.asset)?;
    let price = parse_usd_price(&args.value)?;
    if price.is_zero() {
        bail!("price must be greater than zero");
    }

    world.protocol.oracle.set_price(asset, price);
    world.venue.set_price(asset, price);

    world.save(state_path)?;
    println!("{} now priced at ${}", world.reserve_symbol(asset), args.value);
    Ok(())
}

pub fn run_advance(args: &AdvanceArgs, state_path: &Path) -> Result<()> {
    let seconds = match (args.seconds, args.days) {
        (Some(s), _) => s,
        (None, Some(d)) => d * 86_400,
        (None, None) => bail!("specify --seconds or --days"),
    };

    let mut world = World::load(state_path)?;
    world.clock += seconds;
    world.save(state_path)?;
    println!("Clock advanced {seconds}s to {}", world.clock);
    Ok(())
}
