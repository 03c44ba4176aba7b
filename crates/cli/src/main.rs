//! Bitmor CLI - Drive the lending protocol engine from a JSON state file.

mod cli;
mod commands;
mod output;
mod state;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands, LoanSubcommand, PoolSubcommand, PriceSubcommand, ReserveSubcommand};
use commands::{
    run_account_show, run_advance, run_faucet, run_init, run_liquidate, run_loan_close,
    run_loan_list, run_loan_open, run_loan_repay, run_loan_show, run_pool_borrow,
    run_pool_deposit, run_pool_repay, run_pool_withdraw, run_price_set, run_reserve_list,
    run_reserve_show,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let state = cli.state.as_path();

    match cli.command {
        Commands::Init(args) => run_init(&args, state)?,
        Commands::Faucet(args) => run_faucet(&args, state)?,
        Commands::Pool { subcommand } => match subcommand {
            PoolSubcommand::Deposit(args) => run_pool_deposit(&args, state)?,
            PoolSubcommand::Withdraw(args) => run_pool_withdraw(&args, state)?,
            PoolSubcommand::Borrow(args) => run_pool_borrow(&args, state)?,
            PoolSubcommand::Repay(args) => run_pool_repay(&args, state)?,
        },
        Commands::Loan { subcommand } => match subcommand {
            LoanSubcommand::Open(args) => run_loan_open(&args, state)?,
            LoanSubcommand::Repay(args) => run_loan_repay(&args, state)?,
            LoanSubcommand::Close(args) => run_loan_close(&args, state)?,
            LoanSubcommand::Show(args) => run_loan_show(&args, cli.format, state)?,
            LoanSubcommand::List(args) => run_loan_list(&args, cli.format, state)?,
        },
        Commands::Liquidate(args) => run_liquidate(&args, state)?,
        Commands::Price { subcommand } => match subcommand {
            PriceSubcommand::Set(args) => run_price_set(&args, state)?,
        },
        Commands::Advance(args) => run_advance(&args, state)?,
        Commands::Reserve { subcommand } => match subcommand {
            ReserveSubcommand::List => run_reserve_list(cli.format, state)?,
            ReserveSubcommand::Show(args) => run_reserve_show(&args, cli.format, state)?,
        },
        Commands::Account(args) => run_account_show(&args, cli.format, state)?,
    }

    Ok(())
}
