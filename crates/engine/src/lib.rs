//! Bitmor Lending Protocol Engine
//!
//! This crate implements a collateralized lending protocol: an index-based
//! reserve money market in the Aave V2 style plus an installment loan
//! product that finances BTC-denominated collateral with a stablecoin
//! deposit.
//!
//! # Overview
//!
//! The engine lets you:
//! - Run interest-accruing reserves with two-slope rate curves
//! - Deposit, withdraw, borrow, and repay against scaled positions
//! - Value positions through a USD-8 oracle and health factor
//! - Originate, amortize, and flash-close installment loans via vaults
//! - Liquidate unhealthy positions, with insured positions shielded to
//!   bounded micro liquidations
//!
//! All state lives in one [`Protocol`] value; every entrypoint is an
//! atomic unit that commits fully or leaves no trace.
//!
//! # Example
//!
//! ```rust,ignore
//! use bitmor_rs_engine::{Protocol, ReserveConfig, DefaultRateStrategy};
//! use alloy_primitives::{Address, U256};
//!
//! let mut protocol = Protocol::new();
//! protocol.init_reserve(usdc, "USDC", ReserveConfig::usdc(),
//!     DefaultRateStrategy::usdc(), now);
//! protocol.oracle.set_price(usdc, U256::from(100_000_000u64));
//!
//! protocol.deposit(usdc, amount, supplier, supplier, now)?;
//! let data = protocol.account_data(supplier, now)?;
//! println!("health factor: {} ray", data.health_factor);
//! ```

pub mod error;
pub mod health;
pub mod ledger;
pub mod liquidation;
pub mod loan;
pub mod math;
pub mod oracle;
pub mod position;
pub mod protocol;
pub mod rates;
pub mod reserve;
pub mod swap;
pub mod vault;

// Re-export commonly used types
pub use error::{ErrorKind, ProtocolError};

// Protocol exports
pub use protocol::{Protocol, FLASH_LOAN_PREMIUM_BPS};

// Reserve and rate exports
pub use rates::{DefaultRateStrategy, InterestRates, RateModel};
pub use reserve::{Reserve, ReserveConfig};

// Math exports
pub use math::{PERCENTAGE_FACTOR, RAY, SECONDS_PER_MONTH, SECONDS_PER_YEAR, WAD};

// Valuation exports
pub use health::{AccountData, HEALTH_FACTOR_LIQUIDATION_THRESHOLD};
pub use oracle::{PriceOracle, StaticPriceOracle, PRICE_DECIMALS};

// Loan and liquidation exports
pub use liquidation::{LiquidationOutcome, LiquidationType, MicroLiquidationPolicy};
pub use loan::{annuity_payment, Loan, LoanRequest, LoanStatus, MAX_DURATION_MONTHS};

// Vault and market-plumbing exports
pub use ledger::Ledger;
pub use swap::{OraclePricedVenue, SwapVenue};
pub use vault::{Escrow, EscrowEntry, VaultMeta, VaultRegistry};
