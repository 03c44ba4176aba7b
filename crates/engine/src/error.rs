//! Error types for the protocol engine.

use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Coarse failure taxonomy, used by operators and the CLI to decide how a
/// failure should be treated. Every [`ProtocolError`] maps onto exactly one
/// kind via [`ProtocolError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed request, rejected before any state is touched
    Input,
    /// Request is well-formed but violates protocol policy
    Policy,
    /// The payer lacks balance or allowance on the ledger
    InsufficientFunds,
    /// An external collaborator (oracle, swap venue, flash loan) failed;
    /// the whole atomic unit was rolled back
    External,
    /// A solvency invariant no longer holds. Never recoverable.
    InvariantBreach,
}

/// Errors surfaced by engine operations.
///
/// Operations are transactional: when any of these is returned, the caller
/// observes no state change at all.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Zero amounts are rejected on every entrypoint
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// The asset has no initialized reserve
    #[error("No reserve for asset {asset}")]
    UnknownReserve { asset: Address },

    /// No loan is keyed by this vault address
    #[error("No loan found for vault {vault}")]
    LoanNotFound { vault: Address },

    /// The loan has already reached a terminal status
    #[error("Loan for vault {vault} is not active")]
    LoanNotActive { vault: Address },

    /// Accrual attempted with a timestamp before the last reserve update
    #[error("Invalid accrual: timestamp {timestamp} is before last update {last_update}")]
    TimestampInPast { timestamp: u64, last_update: u64 },

    /// The reserve has not been activated
    #[error("Reserve {asset} is not active")]
    ReserveNotActive { asset: Address },

    /// The reserve is frozen: no new deposits or borrows
    #[error("Reserve {asset} is frozen")]
    ReserveFrozen { asset: Address },

    /// Borrowing is disabled for this reserve
    #[error("Borrowing is disabled on reserve {asset}")]
    BorrowingDisabled { asset: Address },

    /// Not enough un-borrowed liquidity in the reserve
    #[error("Insufficient liquidity in reserve {asset}: requested {requested}, available {available}")]
    InsufficientLiquidity {
        asset: Address,
        requested: U256,
        available: U256,
    },

    /// The operation would leave (or originate) the position undercollateralized
    #[error("Health factor too low for {account}: {health_factor} ray")]
    HealthFactorTooLow {
        account: Address,
        health_factor: U256,
    },

    /// The requested borrow exceeds the LTV-weighted borrowing power
    #[error("Collateral cannot cover new borrow for {account}")]
    CollateralCannotCoverBorrow { account: Address },

    /// Liquidation was called on a position that is not eligible
    #[error("Position {vault} is not eligible for liquidation")]
    LiquidationNotEligible { vault: Address },

    /// Full liquidation attempted on an insured position; insurance is the
    /// first claim on the shortfall, never the liquidator
    #[error("Vault {vault} is insured; full liquidation is suppressed")]
    InsuredPositionProtected { vault: Address },

    /// debt_to_cover exceeds the ceiling for the liquidation type
    #[error("Debt to cover {requested} exceeds ceiling {max_allowed} for vault {vault}")]
    DebtCoverTooHigh {
        vault: Address,
        requested: U256,
        max_allowed: U256,
    },

    /// Ledger balance too small for the requested transfer
    #[error("Insufficient balance of {asset} for {account}: requested {requested}, available {available}")]
    InsufficientBalance {
        asset: Address,
        account: Address,
        requested: U256,
        available: U256,
    },

    /// Ledger allowance too small for the requested pull
    #[error("Insufficient allowance of {asset} from {owner} to {spender}")]
    InsufficientAllowance {
        asset: Address,
        owner: Address,
        spender: Address,
    },

    /// Oracle returned a zero or missing price; valuations must not proceed
    #[error("Stale or missing price for asset {asset}")]
    InvalidPrice { asset: Address },

    /// Swap venue returned less than the caller-specified minimum
    #[error("Swap output {actual} below minimum {min_out}")]
    SlippageExceeded { min_out: U256, actual: U256 },

    /// Flash loan principal plus premium could not be returned in-unit
    #[error("Flash loan shortfall: owed {owed}, available {available}")]
    FlashLoanShortfall { owed: U256, available: U256 },

    /// A loan-management operation re-entered before completing
    #[error("Vault {vault} has an operation in progress")]
    VaultBusy { vault: Address },

    /// Deposit covers the whole collateral cost; there is nothing to finance
    #[error("Deposit {deposit} covers collateral cost {cost}; nothing to borrow")]
    NothingToFinance { deposit: U256, cost: U256 },

    /// Loan duration must be at least one month
    #[error("Invalid loan duration: {months} months")]
    InvalidDuration { months: u64 },

    /// Repay called against an account with no outstanding debt
    #[error("Account {account} has no {asset} debt to repay")]
    NothingToRepay { account: Address, asset: Address },

    /// A reserve index moved backwards. Must never happen.
    #[error("Index regression on reserve {asset}")]
    IndexRegression { asset: Address },

    /// A balance update would underflow. Must never happen.
    #[error("Balance underflow on reserve {asset}: subtracting {delta} from {balance}")]
    BalanceUnderflow {
        asset: Address,
        balance: U256,
        delta: U256,
    },
}

impl ProtocolError {
    /// Maps this error onto the coarse failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAmount
            | Self::UnknownReserve { .. }
            | Self::LoanNotFound { .. }
            | Self::TimestampInPast { .. }
            | Self::InvalidDuration { .. }
            | Self::NothingToRepay { .. }
            | Self::NothingToFinance { .. } => ErrorKind::Input,

            Self::LoanNotActive { .. }
            | Self::ReserveNotActive { .. }
            | Self::ReserveFrozen { .. }
            | Self::BorrowingDisabled { .. }
            | Self::InsufficientLiquidity { .. }
            | Self::HealthFactorTooLow { .. }
            | Self::CollateralCannotCoverBorrow { .. }
            | Self::LiquidationNotEligible { .. }
            | Self::InsuredPositionProtected { .. }
            | Self::DebtCoverTooHigh { .. }
            | Self::VaultBusy { .. } => ErrorKind::Policy,

            Self::InsufficientBalance { .. } | Self::InsufficientAllowance { .. } => {
                ErrorKind::InsufficientFunds
            }

            Self::InvalidPrice { .. }
            | Self::SlippageExceeded { .. }
            | Self::FlashLoanShortfall { .. } => ErrorKind::External,

            Self::IndexRegression { .. } | Self::BalanceUnderflow { .. } => {
                ErrorKind::InvariantBreach
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(ProtocolError::ZeroAmount.kind(), ErrorKind::Input);
        assert_eq!(
            ProtocolError::InsuredPositionProtected {
                vault: Address::ZERO
            }
            .kind(),
            ErrorKind::Policy
        );
        assert_eq!(
            ProtocolError::InvalidPrice {
                asset: Address::ZERO
            }
            .kind(),
            ErrorKind::External
        );
        assert_eq!(
            ProtocolError::IndexRegression {
                asset: Address::ZERO
            }
            .kind(),
            ErrorKind::InvariantBreach
        );
    }
}
