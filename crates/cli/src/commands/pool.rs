//! Pool-level money market commands.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use crate::cli::PoolOpArgs;
use crate::state::{format_amount, parse_amount, resolve_account, World};

pub fn run_pool_deposit(args: &PoolOpArgs, state_path: &Path) -> Result<()> {
    let mut world = World::load(state_path)?;
    let account = resolve_account(&args.account);
    let asset = world.resolve_asset(&args.asset)?;
    let amount = parse_amount(&args.amount, world.reserve_decimals(asset)?)?;

    let clock = world.clock;
    world
        .protocol
        .deposit(asset, amount, account, account, clock)?;

    world.save(state_path)?;
    println!(
        "{} {} {} from {account}",
        "Deposited".green().bold(),
        args.amount,
        world.reserve_symbol(asset)
    );
    Ok(())
}

pub fn run_pool_withdraw(args: &PoolOpArgs, state_path: &Path) -> Result<()> {
    let mut world = World::load(state_path)?;
    let account = resolve_account(&args.account);
    let asset = world.resolve_asset(&args.asset)?;
    let decimals = world.reserve_decimals(asset)?;
    let amount = parse_amount(&args.amount, decimals)?;

    let clock = world.clock;
    let withdrawn = world
        .protocol
        .withdraw(asset, amount, account, account, clock)?;

    world.save(state_path)?;
    println!(
        "{} {} {} to {account}",
        "Withdrew".green().bold(),
        format_amount(withdrawn, decimals),
        world.reserve_symbol(asset)
    );
    Ok(())
}

pub fn run_pool_borrow(args: &PoolOpArgs, state_path: &Path) -> Result<()> {
    let mut world = World::load(state_path)?;
    let account = resolve_account(&args.account);
    let asset = world.resolve_asset(&args.asset)?;
    let amount = parse_amount(&args.amount, world.reserve_decimals(asset)?)?;

    let clock = world.clock;
    world
        .protocol
        .borrow(asset, amount, account, account, clock)?;

    world.save(state_path)?;
    println!(
        "{} {} {} to {account}",
        "Borrowed".green().bold(),
        args.amount,
        world.reserve_symbol(asset)
    );
    Ok(())
}

pub fn run_pool_repay(args: &PoolOpArgs, state_path: &Path) -> Result<()> {
    let mut world = World::load(state_path)?;
    let account = resolve_account(&args.account);
    let asset = world.resolve_asset(&args.asset)?;
    let decimals = world.reserve_decimals(asset)?;
    let amount = parse_amount(&args.amount, decimals)?;

    let clock = world.clock;
    let applied = world
        .protocol
        .repay(asset, amount, account, account, clock)?;

    world.save(state_path)?;
    println!(
        "{} {} {} for {account}",
        "Repaid".green().bold(),
        format_amount(applied, decimals),
        world.reserve_symbol(asset)
    );
    Ok(())
}
