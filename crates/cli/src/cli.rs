//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Bitmor CLI - Drive the lending protocol engine from a state file
#[derive(Parser, Debug)]
#[command(name = "bitmor")]
#[command(about = "Console for the Bitmor lending protocol", long_about = None)]
pub struct Cli {
    /// Path to the protocol state file
    #[arg(long, global = true, env = "BITMOR_STATE", default_value = "bitmor-state.json")]
    pub state: PathBuf,

    /// Output format
    #[arg(long, global = true, default_value = "table")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a fresh protocol state with the USDC and cbBTC reserves
    Init(InitArgs),
    /// Mint test tokens to an account and approve the pool
    Faucet(FaucetArgs),
    /// Pool-level money market operations
    Pool {
        #[command(subcommand)]
        subcommand: PoolSubcommand,
    },
    /// Installment loan lifecycle
    Loan {
        #[command(subcommand)]
        subcommand: LoanSubcommand,
    },
    /// Liquidate an unhealthy vault position
    Liquidate(LiquidateArgs),
    /// Oracle price administration
    Price {
        #[command(subcommand)]
        subcommand: PriceSubcommand,
    },
    /// Move the logical clock forward
    Advance(AdvanceArgs),
    /// Show reserve states
    Reserve {
        #[command(subcommand)]
        subcommand: ReserveSubcommand,
    },
    /// Show an account's balances and health
    Account(AccountArgs),
}

#[derive(Subcommand, Debug)]
pub enum PoolSubcommand {
    /// Supply an asset to the pool
    Deposit(PoolOpArgs),
    /// Withdraw a supplied asset from the pool
    Withdraw(PoolOpArgs),
    /// Borrow an asset against supplied collateral
    Borrow(PoolOpArgs),
    /// Repay borrowed debt
    Repay(PoolOpArgs),
}

#[derive(Subcommand, Debug)]
pub enum LoanSubcommand {
    /// Originate an installment loan
    Open(LoanOpenArgs),
    /// Pay an installment (or any amount) against a loan
    Repay(LoanRepayArgs),
    /// Settle a loan early via flash loan
    Close(LoanCloseArgs),
    /// Show one loan in detail
    Show(LoanShowArgs),
    /// List a borrower's loans
    List(LoanListArgs),
}

#[derive(Subcommand, Debug)]
pub enum PriceSubcommand {
    /// Set an asset's oracle price in whole USD
    Set(PriceSetArgs),
}

#[derive(Subcommand, Debug)]
pub enum ReserveSubcommand {
    /// Show all reserves
    List,
    /// Show one reserve in detail
    Show(ReserveShowArgs),
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Starting unix timestamp for the logical clock
    #[arg(long, default_value = "1700000000")]
    pub genesis: u64,

    /// Slippage the reference swap venue applies, in bps
    #[arg(long, default_value = "10")]
    pub venue_slippage_bps: u64,

    /// Initial cbBTC oracle price in whole USD
    #[arg(long, default_value = "60000")]
    pub btc_price: String,
}

#[derive(Parser, Debug)]
pub struct FaucetArgs {
    /// Receiving account (hex address or alias)
    pub account: String,

    /// Asset symbol or address
    #[arg(long)]
    pub asset: String,

    /// Amount in human-readable units (e.g. "100.5")
    #[arg(long)]
    pub amount: String,
}

#[derive(Parser, Debug)]
pub struct PoolOpArgs {
    /// Acting account (hex address or alias)
    pub account: String,

    /// Asset symbol or address
    #[arg(long)]
    pub asset: String,

    /// Amount in human-readable units
    #[arg(long)]
    pub amount: String,
}

#[derive(Parser, Debug)]
pub struct LoanOpenArgs {
    /// Borrower (hex address or alias)
    pub borrower: String,

    /// Stablecoin deposit in human-readable units
    #[arg(long)]
    pub deposit: String,

    /// Collateral units to purchase (e.g. "1" for 1 cbBTC)
    #[arg(long)]
    pub collateral: String,

    /// Term in months
    #[arg(long)]
    pub months: u64,

    /// Insurance policy id; zero or omitted means uninsured
    #[arg(long, default_value = "0")]
    pub insurance_id: u64,

    /// Debt-side asset (defaults to USDC)
    #[arg(long, default_value = "USDC")]
    pub stable_asset: String,

    /// Collateral asset (defaults to cbBTC)
    #[arg(long, default_value = "cbBTC")]
    pub collateral_asset: String,
}

#[derive(Parser, Debug)]
pub struct LoanRepayArgs {
    /// Vault address the loan is keyed by
    pub vault: String,

    /// Payment in human-readable units
    #[arg(long)]
    pub amount: String,
}

#[derive(Parser, Debug)]
pub struct LoanCloseArgs {
    /// Vault address the loan is keyed by
    pub vault: String,

    /// Pay the remainder out in the collateral asset instead of the stable
    #[arg(long)]
    pub in_collateral: bool,
}

#[derive(Parser, Debug)]
pub struct LoanShowArgs {
    /// Vault address the loan is keyed by
    pub vault: String,
}

#[derive(Parser, Debug)]
pub struct LoanListArgs {
    /// Borrower (hex address or alias)
    pub borrower: String,
}

#[derive(Parser, Debug)]
pub struct LiquidateArgs {
    /// Vault address to liquidate
    pub vault: String,

    /// Liquidating account (hex address or alias)
    #[arg(long)]
    pub liquidator: String,

    /// Debt asset to cover
    #[arg(long, default_value = "USDC")]
    pub debt_asset: String,

    /// Collateral asset to seize
    #[arg(long, default_value = "cbBTC")]
    pub collateral_asset: String,

    /// Debt to cover in human-readable units
    #[arg(long)]
    pub amount: String,
}

#[derive(Parser, Debug)]
pub struct PriceSetArgs {
    /// Asset symbol or address
    pub asset: String,

    /// Price in whole USD (e.g. "60000" or "60000.50")
    pub value: String,
}

#[derive(Parser, Debug)]
pub struct AdvanceArgs {
    /// Seconds to advance
    #[arg(long, conflicts_with = "days")]
    pub seconds: Option<u64>,

    /// Days to advance
    #[arg(long)]
    pub days: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct ReserveShowArgs {
    /// Asset symbol or address
    pub asset: String,
}

#[derive(Parser, Debug)]
pub struct AccountArgs {
    /// Account to inspect (hex address or alias)
    pub account: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
