//! Liquidation decisioning and execution.
//!
//! Classification comes first: a position is `Full`-liquidatable only
//! when it is unhealthy *and* uninsured. Insured positions are shielded —
//! insurance money, not the liquidator, is the first claim on the
//! shortfall — so at most a bounded "micro" slice may be shaved off to
//! push health back above the threshold, and the seized receipt parks in
//! escrow for the insurance pathway instead of going to the caller.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::health::{asset_value, value_to_amount};
use crate::loan::LoanStatus;
use crate::math::{min, percent_mul, ray_div};
use crate::oracle::PriceOracle;
use crate::protocol::{require_nonzero, Protocol};

/// How a position may be liquidated right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidationType {
    /// Healthy, or fully shielded by insurance
    None,
    /// Uninsured and unhealthy: up to 100% of debt may be covered
    Full,
    /// Insured and unhealthy: a bounded slice may be shaved
    Micro,
}

/// Bounds for micro liquidations of insured positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroLiquidationPolicy {
    /// Largest share of outstanding debt one call may cover, in bps.
    /// Zero means insurance absorbs the whole shortfall and third-party
    /// liquidation is suppressed entirely.
    pub max_debt_slice_bps: u64,
}

impl Default for MicroLiquidationPolicy {
    fn default() -> Self {
        Self {
            max_debt_slice_bps: 500,
        }
    }
}

/// What a liquidation call settled.
#[derive(Debug, Clone, Copy)]
pub struct LiquidationOutcome {
    pub liquidation_type: LiquidationType,
    /// Debt-asset amount pulled from the liquidator and repaid
    pub debt_covered: U256,
    /// Collateral-asset amount seized (to the liquidator, or to escrow
    /// for insured positions)
    pub collateral_seized: U256,
}

impl Protocol {
    /// Decides how the loan keyed by `vault` may be liquidated.
    pub fn classify(
        &self,
        vault: Address,
        timestamp: u64,
    ) -> Result<LiquidationType, ProtocolError> {
        let loan = self
            .loans
            .get(&vault)
            .ok_or(ProtocolError::LoanNotFound { vault })?;
        if loan.status != LoanStatus::Active {
            return Ok(LiquidationType::None);
        }

        let data = self.account_data(vault, timestamp)?;
        if !data.is_unhealthy() {
            return Ok(LiquidationType::None);
        }

        if loan.is_insured() {
            if self.micro_policy.max_debt_slice_bps == 0 {
                Ok(LiquidationType::None)
            } else {
                Ok(LiquidationType::Micro)
            }
        } else {
            Ok(LiquidationType::Full)
        }
    }

    /// Third-party liquidation entrypoint.
    ///
    /// Pulls `debt_to_cover` of the debt asset from `liquidator`, repays
    /// the vault's pool debt with it, and seizes bonus-weighted
    /// collateral, clamped to the vault's actual balance (the clamp is
    /// policy, not an error). Rejects ineligible positions and covers
    /// above the per-type ceiling before touching any state.
    pub fn liquidation_call(
        &mut self,
        collateral_asset: Address,
        debt_asset: Address,
        vault: Address,
        debt_to_cover: U256,
        liquidator: Address,
        timestamp: u64,
    ) -> Result<LiquidationOutcome, ProtocolError> {
        self.transactional(|p| {
            p.liquidation_call_inner(
                collateral_asset,
                debt_asset,
                vault,
                debt_to_cover,
                liquidator,
                timestamp,
            )
        })
    }

    fn liquidation_call_inner(
        &mut self,
        collateral_asset: Address,
        debt_asset: Address,
        vault: Address,
        debt_to_cover: U256,
        liquidator: Address,
        timestamp: u64,
    ) -> Result<LiquidationOutcome, ProtocolError> {
        require_nonzero(debt_to_cover)?;

        let liquidation_type = self.classify(vault, timestamp)?;

        let loan = self
            .loans
            .get(&vault)
            .ok_or(ProtocolError::LoanNotFound { vault })?
            .clone();

        let max_cover = match liquidation_type {
            LiquidationType::None => {
                return Err(ProtocolError::LiquidationNotEligible { vault });
            }
            LiquidationType::Full => self.debt_of(vault, debt_asset, timestamp)?,
            LiquidationType::Micro => percent_mul(
                self.debt_of(vault, debt_asset, timestamp)?,
                self.micro_policy.max_debt_slice_bps,
            ),
        };
        if debt_to_cover > max_cover {
            // An insured position never yields to a full-coverage call
            if loan.is_insured() {
                return Err(ProtocolError::InsuredPositionProtected { vault });
            }
            return Err(ProtocolError::DebtCoverTooHigh {
                vault,
                requested: debt_to_cover,
                max_allowed: max_cover,
            });
        }

        // Price both legs; stale feeds abort before any mutation
        let debt_price = self.oracle.get_asset_price(debt_asset)?;
        let collateral_price = self.oracle.get_asset_price(collateral_asset)?;
        let debt_reserve_decimals = self.reserve(debt_asset)?.config.decimals;
        let collateral_reserve = self.reserve(collateral_asset)?;
        let collateral_decimals = collateral_reserve.config.decimals;
        let bonus_bps = collateral_reserve.config.liquidation_bonus_bps;

        let covered_value = asset_value(debt_to_cover, debt_price, debt_reserve_decimals);
        let seize_ideal = percent_mul(
            value_to_amount(covered_value, collateral_price, collateral_decimals)?,
            bonus_bps,
        );
        let vault_collateral = self.collateral_of(vault, collateral_asset, timestamp)?;
        let collateral_seized = min(seize_ideal, vault_collateral);

        // Apply the repayment against the pool on the vault's behalf
        let covered = self.repay_inner(debt_asset, debt_to_cover, vault, liquidator, timestamp)?;

        // Move the seized collateral out of the vault's position
        let income_index = self.reserve(collateral_asset)?.normalized_income(timestamp)?;
        let seized_scaled = if collateral_seized == vault_collateral {
            self.position(vault).collateral_scaled(collateral_asset)
        } else {
            ray_div(collateral_seized, income_index)
        };
        self.position_mut(vault)
            .sub_collateral_scaled(collateral_asset, seized_scaled)?;

        if loan.is_insured() {
            // The receipt keeps earning supplier interest inside the pool
            // until the insurance pathway settles it
            self.escrow.hold(
                vault,
                collateral_asset,
                seized_scaled,
                loan.insurance_id,
                timestamp,
            );
        } else {
            let pool = self.pool_account;
            let reserve = self.reserve_mut(collateral_asset)?;
            reserve.accrue(timestamp)?;
            reserve.draw_liquidity(collateral_seized)?;
            reserve.update_rates();
            self.ledger
                .transfer(collateral_asset, pool, liquidator, collateral_seized)?;
        }

        // A covered position with nothing left owing is terminal
        if self.debt_of(vault, debt_asset, timestamp)?.is_zero() {
            if let Some(loan) = self.loans.get_mut(&vault) {
                loan.status = LoanStatus::Liquidated;
            }
            self.vaults.release(vault);
        }

        Ok(LiquidationOutcome {
            liquidation_type,
            debt_covered: covered,
            collateral_seized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::loan::Loan;
    use crate::rates::DefaultRateStrategy;
    use crate::reserve::ReserveConfig;

    const USDC: Address = Address::repeat_byte(0xA1);
    const CBBTC: Address = Address::repeat_byte(0xB1);

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    /// A protocol with an open vault position: 1 cbBTC collateral against
    /// a 30k USDC debt, healthy at the initial $60k price.
    fn create_protocol_with_position(insurance_id: u64) -> (Protocol, Address) {
        let mut protocol = Protocol::new();
        protocol.init_reserve(
            USDC,
            "USDC",
            ReserveConfig::usdc(),
            DefaultRateStrategy::usdc(),
            1_000,
        );
        protocol.init_reserve(
            CBBTC,
            "cbBTC",
            ReserveConfig::cbbtc(),
            DefaultRateStrategy::cbbtc(),
            1_000,
        );
        protocol.oracle.set_price(USDC, U256::from(100_000_000u64));
        protocol
            .oracle
            .set_price(CBBTC, U256::from(60_000_00000000u64));

        // Seed pool liquidity
        let lp = addr(9);
        protocol.ledger.mint(USDC, lp, U256::from(100_000_000_000u64));
        protocol
            .ledger
            .approve(USDC, lp, protocol.pool_account, U256::from(100_000_000_000u64));
        protocol
            .deposit(USDC, U256::from(100_000_000_000u64), lp, lp, 1_000)
            .unwrap();

        // Hand-build the vault position the loan manager would create
        let borrower = addr(1);
        let vault = protocol.vaults.obtain(borrower, 1_000);
        protocol.vaults.occupy(vault);
        protocol.ledger.mint(CBBTC, vault, U256::from(100_000_000u64));
        protocol
            .deposit_from_vault_inner(CBBTC, U256::from(100_000_000u64), vault, 1_000)
            .unwrap();
        protocol
            .borrow_inner(USDC, U256::from(30_000_000_000u64), vault, vault, 1_000, true)
            .unwrap();

        let loan = Loan {
            borrower,
            vault,
            stable_asset: USDC,
            collateral_asset: CBBTC,
            deposit_amount: U256::from(30_000_000_000u64),
            loan_amount: U256::from(30_000_000_000u64),
            collateral_amount: U256::from(100_000_000u64),
            estimated_monthly_payment: U256::from(2_600_000_000u64),
            duration: 12,
            insurance_id,
            created_at: 1_000,
            next_due_timestamp: 1_000 + crate::math::SECONDS_PER_MONTH,
            last_due_timestamp: 1_000,
            status: LoanStatus::Active,
        };
        protocol.loans.insert(vault, loan);
        (protocol, vault)
    }

    fn crash_collateral(protocol: &mut Protocol) {
        // 60% crash: price kept at 40% of original
        protocol
            .oracle
            .set_price(CBBTC, U256::from(24_000_00000000u64));
    }

    #[test]
    fn test_classify_healthy_is_none() {
        let (protocol, vault) = create_protocol_with_position(0);
        assert_eq!(
            protocol.classify(vault, 1_000).unwrap(),
            LiquidationType::None
        );
    }

    #[test]
    fn test_classify_uninsured_crash_is_full() {
        let (mut protocol, vault) = create_protocol_with_position(0);
        crash_collateral(&mut protocol);
        assert_eq!(
            protocol.classify(vault, 1_000).unwrap(),
            LiquidationType::Full
        );
    }

    #[test]
    fn test_classify_insured_crash_is_micro_never_full() {
        let (mut protocol, vault) = create_protocol_with_position(1);
        crash_collateral(&mut protocol);
        assert_eq!(
            protocol.classify(vault, 1_000).unwrap(),
            LiquidationType::Micro
        );
    }

    #[test]
    fn test_classify_insured_zero_policy_is_none() {
        let (mut protocol, vault) = create_protocol_with_position(1);
        protocol.micro_policy.max_debt_slice_bps = 0;
        crash_collateral(&mut protocol);
        assert_eq!(
            protocol.classify(vault, 1_000).unwrap(),
            LiquidationType::None
        );
    }

    #[test]
    fn test_healthy_position_cannot_be_liquidated() {
        let (mut protocol, vault) = create_protocol_with_position(1);
        let liquidator = addr(5);
        protocol
            .ledger
            .mint(USDC, liquidator, U256::from(30_000_000_000u64));
        protocol.ledger.approve(
            USDC,
            liquidator,
            protocol.pool_account,
            U256::from(30_000_000_000u64),
        );

        let err = protocol
            .liquidation_call(
                CBBTC,
                USDC,
                vault,
                U256::from(1_000_000_000u64),
                liquidator,
                1_000,
            )
            .unwrap_err();
        assert!(matches!(err, ProtocolError::LiquidationNotEligible { .. }));
        assert_eq!(err.kind(), ErrorKind::Policy);
    }

    #[test]
    fn test_full_liquidation_of_uninsured_crash() {
        let (mut protocol, vault) = create_protocol_with_position(0);
        crash_collateral(&mut protocol);

        let debt = protocol.debt_of(vault, USDC, 1_000).unwrap();
        let liquidator = addr(5);
        protocol.ledger.mint(USDC, liquidator, debt);
        protocol
            .ledger
            .approve(USDC, liquidator, protocol.pool_account, debt);

        let outcome = protocol
            .liquidation_call(CBBTC, USDC, vault, debt, liquidator, 1_000)
            .unwrap();
        assert_eq!(outcome.liquidation_type, LiquidationType::Full);
        assert_eq!(outcome.debt_covered, debt);
        assert!(outcome.collateral_seized > U256::ZERO);

        // The liquidator received the seized collateral plus bonus
        assert_eq!(
            protocol.ledger.balance_of(CBBTC, liquidator),
            outcome.collateral_seized
        );
        // Debt exhausted: status flipped
        assert_eq!(
            protocol.loans[&vault].status,
            LoanStatus::Liquidated
        );
        assert_eq!(protocol.debt_of(vault, USDC, 1_000).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_insured_full_coverage_reverts_unchanged() {
        let (mut protocol, vault) = create_protocol_with_position(1);
        crash_collateral(&mut protocol);

        let debt = protocol.debt_of(vault, USDC, 1_000).unwrap();
        let collateral_before = protocol.collateral_of(vault, CBBTC, 1_000).unwrap();
        let liquidator = addr(5);
        protocol.ledger.mint(USDC, liquidator, debt);
        protocol
            .ledger
            .approve(USDC, liquidator, protocol.pool_account, debt);

        let err = protocol
            .liquidation_call(CBBTC, USDC, vault, debt, liquidator, 1_000)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InsuredPositionProtected { .. }));
        assert_eq!(err.kind(), ErrorKind::Policy);

        // Debt and collateral byte-identical to pre-call values
        assert_eq!(protocol.debt_of(vault, USDC, 1_000).unwrap(), debt);
        assert_eq!(
            protocol.collateral_of(vault, CBBTC, 1_000).unwrap(),
            collateral_before
        );
        assert_eq!(protocol.loans[&vault].status, LoanStatus::Active);
    }

    #[test]
    fn test_micro_liquidation_seizes_into_escrow() {
        let (mut protocol, vault) = create_protocol_with_position(1);
        crash_collateral(&mut protocol);

        let debt = protocol.debt_of(vault, USDC, 1_000).unwrap();
        let slice = percent_mul(debt, 500);
        let liquidator = addr(5);
        protocol.ledger.mint(USDC, liquidator, slice);
        protocol
            .ledger
            .approve(USDC, liquidator, protocol.pool_account, slice);

        let outcome = protocol
            .liquidation_call(CBBTC, USDC, vault, slice, liquidator, 1_000)
            .unwrap();
        assert_eq!(outcome.liquidation_type, LiquidationType::Micro);

        // Receipt went to escrow, not the liquidator
        assert_eq!(protocol.ledger.balance_of(CBBTC, liquidator), U256::ZERO);
        assert_eq!(protocol.escrow.entries_for(vault).count(), 1);
        // Loan stays active with reduced debt
        assert_eq!(protocol.loans[&vault].status, LoanStatus::Active);
        assert_eq!(
            protocol.debt_of(vault, USDC, 1_000).unwrap(),
            debt - slice
        );
    }

    #[test]
    fn test_micro_cover_above_cap_rejected() {
        let (mut protocol, vault) = create_protocol_with_position(1);
        crash_collateral(&mut protocol);

        let debt = protocol.debt_of(vault, USDC, 1_000).unwrap();
        let above_cap = percent_mul(debt, 600);
        let liquidator = addr(5);
        protocol.ledger.mint(USDC, liquidator, above_cap);
        protocol
            .ledger
            .approve(USDC, liquidator, protocol.pool_account, above_cap);

        let err = protocol
            .liquidation_call(CBBTC, USDC, vault, above_cap, liquidator, 1_000)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InsuredPositionProtected { .. }));
    }

    #[test]
    fn test_seizure_clamped_to_vault_collateral() {
        let (mut protocol, vault) = create_protocol_with_position(0);
        // Catastrophic crash: collateral worth far less than debt
        protocol
            .oracle
            .set_price(CBBTC, U256::from(10_000_00000000u64));

        let debt = protocol.debt_of(vault, USDC, 1_000).unwrap();
        let liquidator = addr(5);
        protocol.ledger.mint(USDC, liquidator, debt);
        protocol
            .ledger
            .approve(USDC, liquidator, protocol.pool_account, debt);

        let outcome = protocol
            .liquidation_call(CBBTC, USDC, vault, debt, liquidator, 1_000)
            .unwrap();
        // Whole vault balance, no more
        assert_eq!(outcome.collateral_seized, U256::from(100_000_000u64));
    }

    #[test]
    fn test_liquidator_without_funds_reverts() {
        let (mut protocol, vault) = create_protocol_with_position(0);
        crash_collateral(&mut protocol);

        let debt = protocol.debt_of(vault, USDC, 1_000).unwrap();
        let broke = addr(6);
        let err = protocol
            .liquidation_call(CBBTC, USDC, vault, debt, broke, 1_000)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        // No state change
        assert_eq!(protocol.debt_of(vault, USDC, 1_000).unwrap(), debt);
    }
}
