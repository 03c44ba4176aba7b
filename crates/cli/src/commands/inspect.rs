//! Read-only inspection commands.

use std::path::Path;

use anyhow::Result;

use crate::cli::{AccountArgs, OutputFormat, ReserveShowArgs};
use crate::output::{format_account_detail, format_reserve_detail, format_reserves_table};
use crate::state::{format_amount, resolve_account, World};

pub fn run_reserve_list(format: OutputFormat, state_path: &Path) -> Result<()> {
    let world = World::load(state_path)?;
    let reserves: Vec<_> = world.protocol.reserves.values().collect();

    match format {
        OutputFormat::Table => {
            println!("{}", format_reserves_table(&reserves));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reserves)?);
        }
    }
    Ok(())
}

pub fn run_reserve_show(
    args: &ReserveShowArgs,
    format: OutputFormat,
    state_path: &Path,
) -> Result<()> {
    let world = World::load(state_path)?;
    let asset = world.resolve_asset(&args.asset)?;
    let reserve = world
        .protocol
        .reserves
        .get(&asset)
        .ok_or_else(|| anyhow::anyhow!("no reserve for asset {asset}"))?;

    match format {
        OutputFormat::Table => {
            println!("{}", format_reserve_detail(reserve, world.clock));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reserve)?);
        }
    }
    Ok(())
}

pub fn run_account_show(args: &AccountArgs, format: OutputFormat, state_path: &Path) -> Result<()> {
    let world = World::load(state_path)?;
    let account = resolve_account(&args.account);
    let data = world.protocol.account_data(account, world.clock)?;

    match format {
        OutputFormat::Table => {
            let balances: Vec<(String, String)> = world
                .protocol
                .reserves
                .values()
                .map(|r| {
                    (
                        r.symbol.clone(),
                        format_amount(
                            world.protocol.ledger.balance_of(r.asset, account),
                            r.config.decimals,
                        ),
                    )
                })
                .collect();
            println!("{}", format_account_detail(account, &data, &balances));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }
    Ok(())
}
