//! Installment loan lifecycle: origination, monthly repayment, close-out.
//!
//! A loan finances the purchase of a volatile collateral asset with a
//! stablecoin deposit. Origination pulls the deposit, borrows the gap
//! between the deposit and the collateral's oracle cost, swaps both legs
//! into the collateral, and supplies it back to the pool under the
//! borrower's vault. The vault is the on-ledger owner of the position;
//! the borrower only ever touches the loan through the manager.
//!
//! Close-out runs Aave-style: flash-borrow the exact outstanding debt,
//! repay it, pull the collateral, swap just enough back to return flash
//! principal plus premium, and pay the remainder out. Every lifecycle
//! operation is one atomic unit.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::health::{asset_value, value_to_amount};
use crate::math::{
    min, percent_mul, ray_div, ray_mul, ray_pow, RAY, SECONDS_PER_MONTH,
};
use crate::oracle::PriceOracle;
use crate::protocol::{require_nonzero, Protocol};
use crate::swap::SwapVenue;

const SECONDS_PER_DAY: u64 = 86_400;

/// Longest financeable term, in months
pub const MAX_DURATION_MONTHS: u64 = 360;

/// Lifecycle state. Transitions are monotone: `Active` moves to exactly
/// one terminal state and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Completed,
    Liquidated,
}

/// One installment loan, keyed by its vault address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub borrower: Address,
    pub vault: Address,
    /// Debt-side asset the loan is denominated in
    pub stable_asset: Address,
    pub collateral_asset: Address,
    /// Stablecoin the borrower put down at origination
    pub deposit_amount: U256,
    /// Stablecoin borrowed against the vault to cover the rest
    pub loan_amount: U256,
    /// Collateral units purchased at origination
    pub collateral_amount: U256,
    /// Annuity installment fixed at origination
    pub estimated_monthly_payment: U256,
    /// Term in months
    pub duration: u64,
    /// Zero means uninsured
    pub insurance_id: u64,
    pub created_at: u64,
    pub next_due_timestamp: u64,
    pub last_due_timestamp: u64,
    pub status: LoanStatus,
}

impl Loan {
    pub fn is_insured(&self) -> bool {
        self.insurance_id != 0
    }

    /// Seconds-floored whole days until the next installment, zero if
    /// already due
    pub fn days_until_due(&self, timestamp: u64) -> u64 {
        self.next_due_timestamp.saturating_sub(timestamp) / SECONDS_PER_DAY
    }

    /// Whole days the next installment is overdue, zero if not yet due
    pub fn days_past_due(&self, timestamp: u64) -> u64 {
        timestamp.saturating_sub(self.next_due_timestamp) / SECONDS_PER_DAY
    }

    pub fn is_overdue(&self, timestamp: u64) -> bool {
        self.status == LoanStatus::Active && timestamp > self.next_due_timestamp
    }
}

/// Standard annuity installment: `P * r * (1+r)^n / ((1+r)^n - 1)` with
/// `r` the per-month rate in ray. A zero rate degenerates to straight
/// principal division.
pub fn annuity_payment(principal: U256, monthly_rate_ray: U256, months: u64) -> U256 {
    if months == 0 {
        return U256::ZERO;
    }
    if monthly_rate_ray.is_zero() {
        return principal / U256::from(months);
    }
    let compounded = ray_pow(RAY + monthly_rate_ray, months);
    let numerator = ray_mul(monthly_rate_ray, compounded);
    let denominator = compounded - RAY;
    ray_mul(principal, ray_div(numerator, denominator))
}

/// Parameters a borrower supplies when originating a loan.
#[derive(Debug, Clone, Copy)]
pub struct LoanRequest {
    pub borrower: Address,
    pub stable_asset: Address,
    pub collateral_asset: Address,
    /// Upfront stable-asset contribution, in token units
    pub deposit_amount: U256,
    /// Collateral units the deposit plus loan should purchase
    pub collateral_amount: U256,
    /// Term length in months
    pub duration: u64,
    /// Nonzero when the borrower carries insurance coverage
    pub insurance_id: u64,
}

impl Protocol {
    /// Originates an installment loan from `request`.
    ///
    /// Pulls the deposit from the borrower (requires a ledger approval
    /// to the pool account), borrows the remainder of the collateral's
    /// oracle cost against the vault, swaps the combined stablecoin into
    /// the collateral asset on `venue`, and supplies it to the pool. The
    /// position must be healthy at origination or the whole unit reverts.
    ///
    /// Returns the vault address the loan is keyed by.
    pub fn initialize_loan(
        &mut self,
        request: &LoanRequest,
        venue: &impl SwapVenue,
        timestamp: u64,
    ) -> Result<Address, ProtocolError> {
        self.transactional(|p| p.initialize_loan_inner(request, venue, timestamp))
    }

    fn initialize_loan_inner(
        &mut self,
        request: &LoanRequest,
        venue: &impl SwapVenue,
        timestamp: u64,
    ) -> Result<Address, ProtocolError> {
        let LoanRequest {
            borrower,
            stable_asset,
            collateral_asset,
            deposit_amount,
            collateral_amount,
            duration,
            insurance_id,
        } = *request;
        require_nonzero(deposit_amount)?;
        require_nonzero(collateral_amount)?;
        if duration == 0 || duration > MAX_DURATION_MONTHS {
            return Err(ProtocolError::InvalidDuration { months: duration });
        }

        let pool = self.pool_account;
        let stable_decimals = self.reserve(stable_asset)?.config.decimals;
        let collateral_decimals = self.reserve(collateral_asset)?.config.decimals;

        let vault = self.vaults.obtain(borrower, timestamp);
        self.vaults.begin_operation(vault)?;
        self.vaults.occupy(vault);

        // Deposit lands in the vault, where the swap will spend it
        self.ledger
            .transfer_from(stable_asset, pool, borrower, vault, deposit_amount)?;

        // Price the collateral purchase in the stable asset
        let stable_price = self.oracle.get_asset_price(stable_asset)?;
        let collateral_price = self.oracle.get_asset_price(collateral_asset)?;
        let cost = value_to_amount(
            asset_value(collateral_amount, collateral_price, collateral_decimals),
            stable_price,
            stable_decimals,
        )?;
        if deposit_amount >= cost {
            return Err(ProtocolError::NothingToFinance {
                deposit: deposit_amount,
                cost,
            });
        }
        let loan_amount = cost - deposit_amount;

        // Health is validated on the final position shape below, not here
        self.borrow_inner(stable_asset, loan_amount, vault, vault, timestamp, false)?;

        // The venue may fill slightly under the oracle quote; anything
        // beyond the close tolerance aborts the origination
        let min_out = percent_mul(collateral_amount, 10_000 - self.close_slippage_tolerance_bps);
        let purchased = venue.swap(
            &mut self.ledger,
            vault,
            stable_asset,
            collateral_asset,
            deposit_amount + loan_amount,
            min_out,
        )?;
        self.deposit_from_vault_inner(collateral_asset, purchased, vault, timestamp)?;

        let data = self.account_data(vault, timestamp)?;
        if data.is_unhealthy() {
            return Err(ProtocolError::HealthFactorTooLow {
                account: vault,
                health_factor: data.health_factor,
            });
        }

        // Installment fixed at the post-borrow variable rate
        let annual_rate = self.reserve(stable_asset)?.current_variable_borrow_rate;
        let monthly_rate = annual_rate / U256::from(12u64);
        let estimated_monthly_payment = annuity_payment(loan_amount, monthly_rate, duration);

        self.loans.insert(
            vault,
            Loan {
                borrower,
                vault,
                stable_asset,
                collateral_asset,
                deposit_amount,
                loan_amount,
                collateral_amount: purchased,
                estimated_monthly_payment,
                duration,
                insurance_id,
                created_at: timestamp,
                next_due_timestamp: timestamp + SECONDS_PER_MONTH,
                last_due_timestamp: timestamp,
                status: LoanStatus::Active,
            },
        );
        self.vaults.end_operation(vault);
        Ok(vault)
    }

    /// Applies `amount` of the stable asset against the loan's accrued
    /// debt, pulled from the borrower (clamped to the outstanding debt).
    ///
    /// A payment of at least the scheduled installment advances the due
    /// date one month. Exhausting the debt flips the loan `Completed` and
    /// returns all collateral to the borrower.
    pub fn repay_loan(
        &mut self,
        vault: Address,
        amount: U256,
        timestamp: u64,
    ) -> Result<U256, ProtocolError> {
        self.transactional(|p| p.repay_loan_inner(vault, amount, timestamp))
    }

    fn repay_loan_inner(
        &mut self,
        vault: Address,
        amount: U256,
        timestamp: u64,
    ) -> Result<U256, ProtocolError> {
        let loan = self
            .loans
            .get(&vault)
            .ok_or(ProtocolError::LoanNotFound { vault })?
            .clone();
        if loan.status != LoanStatus::Active {
            return Err(ProtocolError::LoanNotActive { vault });
        }
        self.vaults.begin_operation(vault)?;

        let applied = self.repay_inner(
            loan.stable_asset,
            amount,
            vault,
            loan.borrower,
            timestamp,
        )?;

        {
            let loan = self.loans.get_mut(&vault).ok_or(ProtocolError::LoanNotFound { vault })?;
            if applied >= loan.estimated_monthly_payment {
                loan.last_due_timestamp = loan.next_due_timestamp;
                loan.next_due_timestamp += SECONDS_PER_MONTH;
            }
        }

        if self
            .debt_of(vault, loan.stable_asset, timestamp)?
            .is_zero()
        {
            let collateral =
                self.collateral_of(vault, loan.collateral_asset, timestamp)?;
            if !collateral.is_zero() {
                self.withdraw_inner(
                    loan.collateral_asset,
                    collateral,
                    vault,
                    loan.borrower,
                    timestamp,
                )?;
            }
            if let Some(loan) = self.loans.get_mut(&vault) {
                loan.status = LoanStatus::Completed;
            }
            self.vaults.release(vault);
        }

        self.vaults.end_operation(vault);
        Ok(applied)
    }

    /// Settles the loan early in one atomic unit.
    ///
    /// Flash-borrows the exact outstanding debt, repays it, withdraws
    /// the collateral, swaps just enough collateral on `venue` to return
    /// flash principal plus premium, and pays the remainder to the
    /// borrower in the collateral asset (`withdraw_in_collateral_asset`)
    /// or the stable asset. Any failure along the way, slippage included,
    /// leaves the loan untouched.
    pub fn close_loan(
        &mut self,
        vault: Address,
        withdraw_in_collateral_asset: bool,
        venue: &impl SwapVenue,
        timestamp: u64,
    ) -> Result<(), ProtocolError> {
        self.transactional(|p| {
            p.close_loan_inner(vault, withdraw_in_collateral_asset, venue, timestamp)
        })
    }

    fn close_loan_inner(
        &mut self,
        vault: Address,
        withdraw_in_collateral_asset: bool,
        venue: &impl SwapVenue,
        timestamp: u64,
    ) -> Result<(), ProtocolError> {
        let loan = self
            .loans
            .get(&vault)
            .ok_or(ProtocolError::LoanNotFound { vault })?
            .clone();
        if loan.status != LoanStatus::Active {
            return Err(ProtocolError::LoanNotActive { vault });
        }
        self.vaults.begin_operation(vault)?;

        let debt = self.debt_of(vault, loan.stable_asset, timestamp)?;
        if debt.is_zero() {
            return Err(ProtocolError::NothingToRepay {
                account: vault,
                asset: loan.stable_asset,
            });
        }

        let premium = self.flash_borrow_inner(loan.stable_asset, debt, vault, timestamp)?;
        self.repay_inner(loan.stable_asset, debt, vault, vault, timestamp)?;

        let collateral = self.collateral_of(vault, loan.collateral_asset, timestamp)?;
        self.withdraw_inner(loan.collateral_asset, collateral, vault, vault, timestamp)?;

        // Size the swap off the oracle quote plus a slippage headroom,
        // never more than the collateral in hand. The min-out guard on the
        // venue keeps the unit honest if the quote was optimistic.
        let owed = debt + premium;
        let stable_price = self.oracle.get_asset_price(loan.stable_asset)?;
        let collateral_price = self.oracle.get_asset_price(loan.collateral_asset)?;
        let stable_decimals = self.reserve(loan.stable_asset)?.config.decimals;
        let collateral_decimals = self.reserve(loan.collateral_asset)?.config.decimals;
        let ideal_in = value_to_amount(
            asset_value(owed, stable_price, stable_decimals),
            collateral_price,
            collateral_decimals,
        )?;
        let amount_in = min(
            percent_mul(ideal_in, 10_000 + self.close_slippage_tolerance_bps),
            collateral,
        );
        venue.swap(
            &mut self.ledger,
            vault,
            loan.collateral_asset,
            loan.stable_asset,
            amount_in,
            owed,
        )?;
        self.flash_settle_inner(loan.stable_asset, debt, premium, vault, timestamp)?;

        // Pay out what is left in the asset the borrower asked for
        let stable_left = self.ledger.balance_of(loan.stable_asset, vault);
        let collateral_left = self.ledger.balance_of(loan.collateral_asset, vault);
        if withdraw_in_collateral_asset {
            if !stable_left.is_zero() {
                let ideal_out = value_to_amount(
                    asset_value(stable_left, stable_price, stable_decimals),
                    collateral_price,
                    collateral_decimals,
                )?;
                venue.swap(
                    &mut self.ledger,
                    vault,
                    loan.stable_asset,
                    loan.collateral_asset,
                    stable_left,
                    percent_mul(ideal_out, 10_000 - self.close_slippage_tolerance_bps),
                )?;
            }
        } else if !collateral_left.is_zero() {
            let ideal_out = value_to_amount(
                asset_value(collateral_left, collateral_price, collateral_decimals),
                stable_price,
                stable_decimals,
            )?;
            venue.swap(
                &mut self.ledger,
                vault,
                loan.collateral_asset,
                loan.stable_asset,
                collateral_left,
                percent_mul(ideal_out, 10_000 - self.close_slippage_tolerance_bps),
            )?;
        }

        // Empty the vault entirely; it goes back to the free list
        for asset in [loan.stable_asset, loan.collateral_asset] {
            let balance = self.ledger.balance_of(asset, vault);
            if !balance.is_zero() {
                self.ledger.transfer(asset, vault, loan.borrower, balance)?;
            }
        }

        if let Some(loan) = self.loans.get_mut(&vault) {
            loan.status = LoanStatus::Completed;
        }
        self.vaults.release(vault);
        self.vaults.end_operation(vault);
        Ok(())
    }

    /// All loans ever opened by `borrower`, in vault-creation order.
    pub fn loans_of(&self, borrower: Address) -> Vec<&Loan> {
        self.vaults
            .vaults_of(borrower)
            .iter()
            .filter_map(|vault| self.loans.get(vault))
            .collect()
    }
}
