//! Installment loan lifecycle commands.

use std::path::Path;

use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use colored::Colorize;

use crate::cli::{LoanCloseArgs, LoanListArgs, LoanOpenArgs, LoanRepayArgs, LoanShowArgs, OutputFormat};
use crate::output::{format_loan_detail, format_loans_table};
use crate::state::{format_amount, parse_amount, resolve_account, World};

fn parse_vault(input: &str) -> Result<Address> {
    input
        .parse::<Address>()
        .map_err(|_| anyhow!("invalid vault address {input:?}"))
}

pub fn run_loan_open(args: &LoanOpenArgs, state_path: &Path) -> Result<()> {
    let mut world = World::load(state_path)?;
    let borrower = resolve_account(&args.borrower);
    let stable_asset = world.resolve_asset(&args.stable_asset)?;
    let collateral_asset = world.resolve_asset(&args.collateral_asset)?;
    let deposit = parse_amount(&args.deposit, world.reserve_decimals(stable_asset)?)?;
    let collateral = parse_amount(&args.collateral, world.reserve_decimals(collateral_asset)?)?;

    let clock = world.clock;
    let venue = world.venue.clone();
    let request = bitmor_rs_engine::LoanRequest {
        borrower,
        stable_asset,
        collateral_asset,
        deposit_amount: deposit,
        collateral_amount: collateral,
        duration: args.months,
        insurance_id: args.insurance_id,
    };
    let vault = world.protocol.initialize_loan(&request, &venue, clock)?;

    let loan = &world.protocol.loans[&vault];
    let stable_decimals = world.reserve_decimals(stable_asset)?;
    println!("{} loan at vault {vault}", "Opened".green().bold());
    println!(
        "  Financed {} {} over {} months, installment {}",
        format_amount(loan.loan_amount, stable_decimals),
        world.reserve_symbol(stable_asset),
        loan.duration,
        format_amount(loan.estimated_monthly_payment, stable_decimals),
    );
    world.save(state_path)?;
    Ok(())
}

pub fn run_loan_repay(args: &LoanRepayArgs, state_path: &Path) -> Result<()> {
    let mut world = World::load(state_path)?;
    let vault = parse_vault(&args.vault)?;
    let loan = world
        .protocol
        .loans
        .get(&vault)
        .ok_or_else(|| anyhow!("no loan at vault {vault}"))?;
    let stable_asset = loan.stable_asset;
    let decimals = world.reserve_decimals(stable_asset)?;
    let amount = parse_amount(&args.amount, decimals)?;

    let clock = world.clock;
    let applied = world.protocol.repay_loan(vault, amount, clock)?;

    let status = world.protocol.loans[&vault].status;
    world.save(state_path)?;
    println!(
        "{} {} {}",
        "Applied".green().bold(),
        format_amount(applied, decimals),
        world.reserve_symbol(stable_asset)
    );
    if status == bitmor_rs_engine::LoanStatus::Completed {
        println!("{} collateral returned to borrower", "Loan completed;".blue().bold());
    }
    Ok(())
}

pub fn run_loan_close(args: &LoanCloseArgs, state_path: &Path) -> Result<()> {
    let mut world = World::load(state_path)?;
    let vault = parse_vault(&args.vault)?;

    let clock = world.clock;
    let venue = world.venue.clone();
    world
        .protocol
        .close_loan(vault, args.in_collateral, &venue, clock)?;

    world.save(state_path)?;
    println!(
        "{} loan at vault {vault}, remainder paid in {}",
        "Closed".green().bold(),
        if args.in_collateral {
            "the collateral asset"
        } else {
            "the stable asset"
        }
    );
    Ok(())
}

pub fn run_loan_show(args: &LoanShowArgs, format: OutputFormat, state_path: &Path) -> Result<()> {
    let world = World::load(state_path)?;
    let vault = parse_vault(&args.vault)?;
    let loan = world
        .protocol
        .loans
        .get(&vault)
        .ok_or_else(|| anyhow!("no loan at vault {vault}"))?;

    match format {
        OutputFormat::Table => {
            let debt = world.protocol.debt_of(vault, loan.stable_asset, world.clock)?;
            let collateral =
                world
                    .protocol
                    .collateral_of(vault, loan.collateral_asset, world.clock)?;
            println!(
                "{}",
                format_loan_detail(
                    loan,
                    debt,
                    collateral,
                    world.reserve_decimals(loan.stable_asset)?,
                    world.reserve_decimals(loan.collateral_asset)?,
                    world.clock,
                )
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(loan)?);
        }
    }
    Ok(())
}

pub fn run_loan_list(args: &LoanListArgs, format: OutputFormat, state_path: &Path) -> Result<()> {
    let world = World::load(state_path)?;
    let borrower = resolve_account(&args.borrower);
    let loans = world.protocol.loans_of(borrower);

    match format {
        OutputFormat::Table => {
            // Loans share the stable asset's decimals in practice; fall
            // back to six when the list is empty
            let decimals = loans
                .first()
                .and_then(|l| world.reserve_decimals(l.stable_asset).ok())
                .unwrap_or(6);
            println!("{}", format_loans_table(&loans, decimals));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&loans)?);
        }
    }
    Ok(())
}
