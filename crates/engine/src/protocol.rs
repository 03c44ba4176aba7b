//! Protocol state root and pool operations.
//!
//! `Protocol` owns every piece of persisted state: reserves, scaled
//! positions, the ledger, the oracle table, loans, the vault registry,
//! and the escrow. There are no ambient globals; callers thread the
//! struct through every engine call.
//!
//! Execution is transaction-serialized: each public entrypoint stages its
//! work on a clone of the state and commits only on success, so a failed
//! operation is observationally free of side effects. External calls
//! (oracle, swap, flash-loan settlement) happen inline inside the same
//! staged unit.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ProtocolError;
use crate::health::{account_data, AccountData, HEALTH_FACTOR_LIQUIDATION_THRESHOLD};
use crate::health::asset_value;
use crate::ledger::Ledger;
use crate::liquidation::MicroLiquidationPolicy;
use crate::loan::Loan;
use crate::math::{min, percent_mul, ray_div, ray_mul};
use crate::oracle::{PriceOracle, StaticPriceOracle};
use crate::position::Position;
use crate::rates::DefaultRateStrategy;
use crate::reserve::{Reserve, ReserveConfig};
use crate::vault::{Escrow, VaultRegistry};

/// Flash loans charge this premium, paid to the reserve's suppliers
pub const FLASH_LOAN_PREMIUM_BPS: u64 = 9;

/// The pool's own ledger account, holding deposited tokens
fn pool_address() -> Address {
    Address::repeat_byte(0xF0)
}

/// Root of all persisted protocol state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Protocol {
    /// Ledger account that custody of pooled tokens runs through
    pub pool_account: Address,
    pub reserves: BTreeMap<Address, Reserve>,
    /// Scaled balances per account (suppliers and vaults alike)
    pub positions: BTreeMap<Address, Position>,
    pub ledger: Ledger,
    pub oracle: StaticPriceOracle,
    pub vaults: VaultRegistry,
    /// Loans keyed by their vault address
    pub loans: BTreeMap<Address, Loan>,
    pub escrow: Escrow,
    pub micro_policy: MicroLiquidationPolicy,
    /// Headroom added on top of the oracle quote when sizing the
    /// close-loan swap input, in bps
    pub close_slippage_tolerance_bps: u64,
}

impl Protocol {
    pub fn new() -> Self {
        Self {
            pool_account: pool_address(),
            reserves: BTreeMap::new(),
            positions: BTreeMap::new(),
            ledger: Ledger::new(),
            oracle: StaticPriceOracle::new(),
            vaults: VaultRegistry::new(),
            loans: BTreeMap::new(),
            escrow: Escrow::new(),
            micro_policy: MicroLiquidationPolicy::default(),
            close_slippage_tolerance_bps: 100,
        }
    }

    /// Admin action: registers a reserve for `asset`. Reserves are never
    /// destroyed once created.
    pub fn init_reserve(
        &mut self,
        asset: Address,
        symbol: impl Into<String>,
        config: ReserveConfig,
        strategy: DefaultRateStrategy,
        timestamp: u64,
    ) {
        self.reserves.insert(
            asset,
            Reserve::new(asset, symbol, config, strategy, timestamp),
        );
    }

    /// Stages `f` on a clone of the state and commits only on success.
    pub(crate) fn transactional<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ProtocolError>,
    ) -> Result<T, ProtocolError> {
        let mut staged = self.clone();
        let value = f(&mut staged)?;
        *self = staged;
        Ok(value)
    }

    pub(crate) fn reserve(&self, asset: Address) -> Result<&Reserve, ProtocolError> {
        self.reserves
            .get(&asset)
            .ok_or(ProtocolError::UnknownReserve { asset })
    }

    pub(crate) fn reserve_mut(&mut self, asset: Address) -> Result<&mut Reserve, ProtocolError> {
        self.reserves
            .get_mut(&asset)
            .ok_or(ProtocolError::UnknownReserve { asset })
    }

    pub(crate) fn position(&self, account: Address) -> Position {
        self.positions.get(&account).cloned().unwrap_or_default()
    }

    pub(crate) fn position_mut(&mut self, account: Address) -> &mut Position {
        self.positions.entry(account).or_default()
    }

    /// Read-only aggregate valuation of `account`, fresh as of `timestamp`
    pub fn account_data(
        &self,
        account: Address,
        timestamp: u64,
    ) -> Result<AccountData, ProtocolError> {
        account_data(
            &self.reserves,
            &self.position(account),
            &self.oracle,
            timestamp,
        )
    }

    /// Current debt of `account` in `asset`, token units
    pub fn debt_of(
        &self,
        account: Address,
        asset: Address,
        timestamp: u64,
    ) -> Result<U256, ProtocolError> {
        self.position(account)
            .debt_balance(self.reserve(asset)?, timestamp)
    }

    /// Current collateral balance of `account` in `asset`, token units
    pub fn collateral_of(
        &self,
        account: Address,
        asset: Address,
        timestamp: u64,
    ) -> Result<U256, ProtocolError> {
        self.position(account)
            .collateral_balance(self.reserve(asset)?, timestamp)
    }

    // ==================== Pool Operations ====================

    /// Deposits `amount` of `asset`, pulled from `from`, credited to
    /// `on_behalf_of`'s position. Requires a prior ledger approval to the
    /// pool account.
    pub fn deposit(
        &mut self,
        asset: Address,
        amount: U256,
        from: Address,
        on_behalf_of: Address,
        timestamp: u64,
    ) -> Result<(), ProtocolError> {
        self.transactional(|p| p.deposit_inner(asset, amount, from, on_behalf_of, timestamp))
    }

    pub(crate) fn deposit_inner(
        &mut self,
        asset: Address,
        amount: U256,
        from: Address,
        on_behalf_of: Address,
        timestamp: u64,
    ) -> Result<(), ProtocolError> {
        require_nonzero(amount)?;
        let pool = self.pool_account;

        let reserve = self.reserve_mut(asset)?;
        reserve.require_active()?;
        reserve.require_not_frozen()?;
        reserve.accrue(timestamp)?;
        let scaled = ray_div(amount, reserve.liquidity_index);
        reserve.restore_liquidity(amount);
        reserve.update_rates();

        self.ledger.transfer_from(asset, pool, from, pool, amount)?;
        self.position_mut(on_behalf_of)
            .add_collateral_scaled(asset, scaled);
        Ok(())
    }

    /// Internal deposit of tokens a vault already holds (no allowance)
    pub(crate) fn deposit_from_vault_inner(
        &mut self,
        asset: Address,
        amount: U256,
        vault: Address,
        timestamp: u64,
    ) -> Result<(), ProtocolError> {
        require_nonzero(amount)?;
        let pool = self.pool_account;

        let reserve = self.reserve_mut(asset)?;
        reserve.require_active()?;
        reserve.require_not_frozen()?;
        reserve.accrue(timestamp)?;
        let scaled = ray_div(amount, reserve.liquidity_index);
        reserve.restore_liquidity(amount);
        reserve.update_rates();

        self.ledger.transfer(asset, vault, pool, amount)?;
        self.position_mut(vault).add_collateral_scaled(asset, scaled);
        Ok(())
    }

    /// Withdraws up to `amount` of `account`'s deposited `asset` to `to`.
    /// Fails if the remaining position would be undercollateralized.
    pub fn withdraw(
        &mut self,
        asset: Address,
        amount: U256,
        account: Address,
        to: Address,
        timestamp: u64,
    ) -> Result<U256, ProtocolError> {
        self.transactional(|p| p.withdraw_inner(asset, amount, account, to, timestamp))
    }

    pub(crate) fn withdraw_inner(
        &mut self,
        asset: Address,
        amount: U256,
        account: Address,
        to: Address,
        timestamp: u64,
    ) -> Result<U256, ProtocolError> {
        require_nonzero(amount)?;
        let pool = self.pool_account;

        let reserve = self.reserve_mut(asset)?;
        reserve.require_active()?;
        reserve.accrue(timestamp)?;
        let index = reserve.liquidity_index;

        let balance = ray_mul(self.position(account).collateral_scaled(asset), index);
        if amount > balance {
            return Err(ProtocolError::InsufficientBalance {
                asset,
                account,
                requested: amount,
                available: balance,
            });
        }

        // Withdrawing the full balance clears the scaled entry exactly
        let scaled = if amount == balance {
            self.position(account).collateral_scaled(asset)
        } else {
            ray_div(amount, index)
        };

        let reserve = self.reserve_mut(asset)?;
        reserve.draw_liquidity(amount)?;
        reserve.update_rates();

        self.position_mut(account).sub_collateral_scaled(asset, scaled)?;

        let data = self.account_data(account, timestamp)?;
        if !data.total_debt_value.is_zero()
            && data.health_factor < HEALTH_FACTOR_LIQUIDATION_THRESHOLD
        {
            return Err(ProtocolError::HealthFactorTooLow {
                account,
                health_factor: data.health_factor,
            });
        }

        self.ledger.transfer(asset, pool, to, amount)?;
        Ok(amount)
    }

    /// Borrows `amount` of `asset` against `account`'s collateral,
    /// sending the proceeds to `to`.
    pub fn borrow(
        &mut self,
        asset: Address,
        amount: U256,
        account: Address,
        to: Address,
        timestamp: u64,
    ) -> Result<(), ProtocolError> {
        self.transactional(|p| {
            p.borrow_inner(asset, amount, account, to, timestamp, true)
        })
    }

    /// `check_collateral = false` defers the health check to the caller;
    /// used by loan origination, which validates the final shape instead.
    pub(crate) fn borrow_inner(
        &mut self,
        asset: Address,
        amount: U256,
        account: Address,
        to: Address,
        timestamp: u64,
        check_collateral: bool,
    ) -> Result<(), ProtocolError> {
        require_nonzero(amount)?;
        let pool = self.pool_account;

        let reserve = self.reserve_mut(asset)?;
        reserve.require_active()?;
        reserve.require_not_frozen()?;
        reserve.require_borrowing_enabled()?;
        reserve.accrue(timestamp)?;

        if check_collateral {
            let reserve = self.reserve(asset)?;
            let price = self.oracle.get_asset_price(asset)?;
            let borrow_value = asset_value(amount, price, reserve.config.decimals);
            let data = self.account_data(account, timestamp)?;
            if borrow_value > data.available_borrow_value() {
                return Err(ProtocolError::CollateralCannotCoverBorrow { account });
            }
        }

        let reserve = self.reserve_mut(asset)?;
        reserve.draw_liquidity(amount)?;
        let scaled = reserve.add_variable_debt(amount);
        reserve.update_rates();

        self.position_mut(account).add_debt_scaled(asset, scaled);
        self.ledger.transfer(asset, pool, to, amount)?;
        Ok(())
    }

    /// Repays up to `amount` of `on_behalf_of`'s `asset` debt, pulling
    /// funds from `from`. Returns the amount actually applied (clamped to
    /// the outstanding debt).
    pub fn repay(
        &mut self,
        asset: Address,
        amount: U256,
        on_behalf_of: Address,
        from: Address,
        timestamp: u64,
    ) -> Result<U256, ProtocolError> {
        self.transactional(|p| p.repay_inner(asset, amount, on_behalf_of, from, timestamp))
    }

    pub(crate) fn repay_inner(
        &mut self,
        asset: Address,
        amount: U256,
        on_behalf_of: Address,
        from: Address,
        timestamp: u64,
    ) -> Result<U256, ProtocolError> {
        require_nonzero(amount)?;
        let pool = self.pool_account;

        let reserve = self.reserve_mut(asset)?;
        reserve.require_active()?;
        reserve.accrue(timestamp)?;
        let index = reserve.variable_borrow_index;

        let scaled_debt = self.position(on_behalf_of).debt_scaled(asset);
        let debt = ray_mul(scaled_debt, index);
        if debt.is_zero() {
            return Err(ProtocolError::NothingToRepay {
                account: on_behalf_of,
                asset,
            });
        }

        // Paying more than owed settles exactly the debt, nothing extra
        let actual = min(amount, debt);

        if from == on_behalf_of && self.vaults.get(from).is_some() {
            // Vaults pay out of their own ledger balance, no allowance
            self.ledger.transfer(asset, from, pool, actual)?;
        } else {
            self.ledger.transfer_from(asset, pool, from, pool, actual)?;
        }

        let position = self.position_mut(on_behalf_of);
        if actual == debt {
            position.clear_debt(asset);
        } else {
            position.sub_debt_scaled(asset, ray_div(actual, index))?;
        }

        let reserve = self.reserve_mut(asset)?;
        if actual == debt {
            reserve.remove_variable_debt_scaled(scaled_debt)?;
        } else {
            reserve.remove_variable_debt_scaled(ray_div(actual, index))?;
        }
        reserve.restore_liquidity(actual);
        reserve.update_rates();

        Ok(actual)
    }

    // ==================== Flash Loan Facility ====================

    /// Lends `amount` of `asset` from the pool to `receiver` with no
    /// collateral. The caller must route `amount + premium` back through
    /// [`Self::flash_settle_inner`] before its unit commits; the
    /// transactional wrapper makes any other outcome unobservable.
    pub(crate) fn flash_borrow_inner(
        &mut self,
        asset: Address,
        amount: U256,
        receiver: Address,
        timestamp: u64,
    ) -> Result<U256, ProtocolError> {
        require_nonzero(amount)?;
        let pool = self.pool_account;

        let reserve = self.reserve_mut(asset)?;
        reserve.require_active()?;
        reserve.accrue(timestamp)?;
        reserve.draw_liquidity(amount)?;

        self.ledger.transfer(asset, pool, receiver, amount)?;
        Ok(percent_mul(amount, FLASH_LOAN_PREMIUM_BPS))
    }

    /// Returns flash principal plus premium to the pool. The premium is
    /// cumulated into the liquidity index, paying the reserve's suppliers.
    pub(crate) fn flash_settle_inner(
        &mut self,
        asset: Address,
        amount: U256,
        premium: U256,
        payer: Address,
        timestamp: u64,
    ) -> Result<(), ProtocolError> {
        let pool = self.pool_account;
        let owed = amount + premium;

        let available = self.ledger.balance_of(asset, payer);
        if available < owed {
            return Err(ProtocolError::FlashLoanShortfall { owed, available });
        }
        self.ledger.transfer(asset, payer, pool, owed)?;

        let reserve = self.reserve_mut(asset)?;
        reserve.cumulate_to_liquidity_index(premium, timestamp)?;
        reserve.restore_liquidity(owed);
        reserve.update_rates();
        Ok(())
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn require_nonzero(amount: U256) -> Result<(), ProtocolError> {
    if amount.is_zero() {
        return Err(ProtocolError::ZeroAmount);
    }
    Ok(())
}
