//! Liquidation command.

use std::path::Path;

use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use bitmor_rs_engine::LiquidationType;
use colored::Colorize;

use crate::cli::LiquidateArgs;
use crate::state::{format_amount, parse_amount, resolve_account, World};

pub fn run_liquidate(args: &LiquidateArgs, state_path: &Path) -> Result<()> {
    let mut world = World::load(state_path)?;
    let vault = args
        .vault
        .parse::<Address>()
        .map_err(|_| anyhow!("invalid vault address {:?}", args.vault))?;
    let liquidator = resolve_account(&args.liquidator);
    let debt_asset = world.resolve_asset(&args.debt_asset)?;
    let collateral_asset = world.resolve_asset(&args.collateral_asset)?;
    let debt_decimals = world.reserve_decimals(debt_asset)?;
    let collateral_decimals = world.reserve_decimals(collateral_asset)?;
    let amount = parse_amount(&args.amount, debt_decimals)?;

    let clock = world.clock;
    let outcome = world.protocol.liquidation_call(
        collateral_asset,
        debt_asset,
        vault,
        amount,
        liquidator,
        clock,
    )?;

    world.save(state_path)?;
    match outcome.liquidation_type {
        LiquidationType::Full => {
            println!(
                "{} covered {} {}, seized {} {}",
                "Full liquidation:".red().bold(),
                format_amount(outcome.debt_covered, debt_decimals),
                world.reserve_symbol(debt_asset),
                format_amount(outcome.collateral_seized, collateral_decimals),
                world.reserve_symbol(collateral_asset),
            );
        }
        LiquidationType::Micro => {
            println!(
                "{} covered {} {}, {} {} held in escrow",
                "Micro liquidation:".yellow().bold(),
                format_amount(outcome.debt_covered, debt_decimals),
                world.reserve_symbol(debt_asset),
                format_amount(outcome.collateral_seized, collateral_decimals),
                world.reserve_symbol(collateral_asset),
            );
        }
        LiquidationType::None => {}
    }
    Ok(())
}
