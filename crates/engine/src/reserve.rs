//! Per-asset reserve state and index accrual.
//!
//! A reserve tracks one pooled asset: its un-borrowed liquidity, its debt
//! totals, and two monotonically non-decreasing ray indices that turn
//! scaled balances into current ones. Every operation that touches a
//! reserve first accrues interest since the last update, applies the
//! economic effect, then re-runs the rate strategy on the post-operation
//! figures.
//!
//! Variable debt is stored scaled by the borrow index, so debt growth is
//! implicit in index growth and the footing invariant stays exact.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::math::{
    calculate_compounded_interest, calculate_linear_interest, ray_div, ray_mul, RAY,
};
use crate::rates::{DefaultRateStrategy, RateModel};

/// Risk and bookkeeping parameters for one reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveConfig {
    /// Max borrowing power per unit of collateral, in bps
    pub ltv_bps: u64,
    /// Collateral valuation weight for health, in bps
    pub liquidation_threshold_bps: u64,
    /// Total collateral awarded per unit of covered debt, in bps
    /// (10_300 = 103% = a 3% bonus)
    pub liquidation_bonus_bps: u64,
    /// Token decimals
    pub decimals: u32,
    /// Share of borrow interest diverted from suppliers, in bps
    pub reserve_factor_bps: u64,
    /// Whether the asset can be borrowed at all
    pub borrowing_enabled: bool,
    /// Inactive reserves reject every operation
    pub active: bool,
    /// Frozen reserves reject deposits and borrows but allow exits
    pub frozen: bool,
}

impl ReserveConfig {
    /// USDC reserve parameters from the Bitmor market configuration
    pub fn usdc() -> Self {
        Self {
            ltv_bps: 8_000,
            liquidation_threshold_bps: 8_500,
            liquidation_bonus_bps: 10_300,
            decimals: 6,
            reserve_factor_bps: 1_000,
            borrowing_enabled: true,
            active: true,
            frozen: false,
        }
    }

    /// cbBTC reserve parameters: collateral-only, threshold sized so
    /// 1/(1 + protocol fee + liquidation bonus) of value is borrowable
    pub fn cbbtc() -> Self {
        Self {
            ltv_bps: 9_000,
            liquidation_threshold_bps: 9_479,
            liquidation_bonus_bps: 10_500,
            decimals: 8,
            reserve_factor_bps: 0,
            borrowing_enabled: false,
            active: true,
            frozen: false,
        }
    }
}

/// Pooled supply and debt accounting for one asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reserve {
    pub asset: Address,
    /// Display symbol, carried for operator tooling
    pub symbol: String,
    pub config: ReserveConfig,
    pub strategy: DefaultRateStrategy,
    /// Cumulative supplier interest index (ray, starts at 1.0)
    pub liquidity_index: U256,
    /// Cumulative variable-debt interest index (ray, starts at 1.0)
    pub variable_borrow_index: U256,
    /// Current annualized supplier rate (ray)
    pub current_liquidity_rate: U256,
    /// Current annualized variable borrow rate (ray)
    pub current_variable_borrow_rate: U256,
    /// Current annualized stable borrow rate (ray)
    pub current_stable_borrow_rate: U256,
    /// Un-borrowed liquidity held by the pool, in token units
    pub available_liquidity: U256,
    /// Outstanding stable-rate debt, in token units
    pub total_stable_debt: U256,
    /// Outstanding variable debt scaled down by the borrow index
    pub total_variable_debt_scaled: U256,
    pub last_update_timestamp: u64,
}

impl Reserve {
    pub fn new(
        asset: Address,
        symbol: impl Into<String>,
        config: ReserveConfig,
        strategy: DefaultRateStrategy,
        timestamp: u64,
    ) -> Self {
        Self {
            asset,
            symbol: symbol.into(),
            config,
            strategy,
            liquidity_index: RAY,
            variable_borrow_index: RAY,
            current_liquidity_rate: U256::ZERO,
            current_variable_borrow_rate: U256::ZERO,
            current_stable_borrow_rate: U256::ZERO,
            available_liquidity: U256::ZERO,
            total_stable_debt: U256::ZERO,
            total_variable_debt_scaled: U256::ZERO,
            last_update_timestamp: timestamp,
        }
    }

    /// The supplier index as of `timestamp`, computed on the fly without
    /// mutating state. Lets read paths (health checks) see fresh values
    /// even when no accounting operation has run this second.
    pub fn normalized_income(&self, timestamp: u64) -> Result<U256, ProtocolError> {
        self.check_timestamp(timestamp)?;
        if timestamp == self.last_update_timestamp {
            return Ok(self.liquidity_index);
        }
        let factor = calculate_linear_interest(
            self.current_liquidity_rate,
            self.last_update_timestamp,
            timestamp,
        );
        Ok(ray_mul(factor, self.liquidity_index))
    }

    /// The variable-debt index as of `timestamp`, computed on the fly.
    pub fn normalized_debt(&self, timestamp: u64) -> Result<U256, ProtocolError> {
        self.check_timestamp(timestamp)?;
        if timestamp == self.last_update_timestamp {
            return Ok(self.variable_borrow_index);
        }
        let factor = calculate_compounded_interest(
            self.current_variable_borrow_rate,
            self.last_update_timestamp,
            timestamp,
        );
        Ok(ray_mul(factor, self.variable_borrow_index))
    }

    /// Current variable debt in token units as of `timestamp`
    pub fn total_variable_debt(&self, timestamp: u64) -> Result<U256, ProtocolError> {
        Ok(ray_mul(
            self.total_variable_debt_scaled,
            self.normalized_debt(timestamp)?,
        ))
    }

    /// `available + stable debt + variable debt`: the reserve footing.
    /// Only legitimate flows (and accrued interest) may move it.
    pub fn footing(&self, timestamp: u64) -> Result<U256, ProtocolError> {
        Ok(self.available_liquidity + self.total_stable_debt + self.total_variable_debt(timestamp)?)
    }

    /// Accrues interest into both indices up to `timestamp`.
    ///
    /// Indices must never move backwards; a regression aborts with a
    /// non-recoverable invariant breach.
    pub fn accrue(&mut self, timestamp: u64) -> Result<(), ProtocolError> {
        let new_liquidity_index = self.normalized_income(timestamp)?;
        let new_variable_index = self.normalized_debt(timestamp)?;

        if new_liquidity_index < self.liquidity_index
            || new_variable_index < self.variable_borrow_index
        {
            return Err(ProtocolError::IndexRegression { asset: self.asset });
        }

        self.liquidity_index = new_liquidity_index;
        self.variable_borrow_index = new_variable_index;
        self.last_update_timestamp = timestamp;
        Ok(())
    }

    /// Re-runs the rate strategy against the post-operation figures.
    /// Call after every balance-changing operation, with accrual done.
    pub fn update_rates(&mut self) {
        let total_variable_debt =
            ray_mul(self.total_variable_debt_scaled, self.variable_borrow_index);
        let rates = self.strategy.calculate_interest_rates(
            self.available_liquidity,
            self.total_stable_debt,
            total_variable_debt,
            self.current_stable_borrow_rate,
            self.config.reserve_factor_bps,
        );
        self.current_liquidity_rate = rates.liquidity_rate;
        self.current_variable_borrow_rate = rates.variable_borrow_rate;
        self.current_stable_borrow_rate = rates.stable_borrow_rate;
    }

    /// Adds variable debt in token units, returning the scaled amount
    pub fn add_variable_debt(&mut self, amount: U256) -> U256 {
        let scaled = ray_div(amount, self.variable_borrow_index);
        self.total_variable_debt_scaled += scaled;
        scaled
    }

    /// Removes variable debt in scaled units
    pub fn remove_variable_debt_scaled(&mut self, scaled: U256) -> Result<(), ProtocolError> {
        self.total_variable_debt_scaled = self
            .total_variable_debt_scaled
            .checked_sub(scaled)
            .ok_or(ProtocolError::BalanceUnderflow {
                asset: self.asset,
                balance: self.total_variable_debt_scaled,
                delta: scaled,
            })?;
        Ok(())
    }

    /// Takes `amount` out of available liquidity
    pub fn draw_liquidity(&mut self, amount: U256) -> Result<(), ProtocolError> {
        if amount > self.available_liquidity {
            return Err(ProtocolError::InsufficientLiquidity {
                asset: self.asset,
                requested: amount,
                available: self.available_liquidity,
            });
        }
        self.available_liquidity -= amount;
        Ok(())
    }

    /// Returns `amount` into available liquidity
    pub fn restore_liquidity(&mut self, amount: U256) {
        self.available_liquidity += amount;
    }

    /// Distributes a windfall (flash-loan premium) to suppliers by
    /// cumulating it straight into the liquidity index.
    pub fn cumulate_to_liquidity_index(&mut self, amount: U256, timestamp: u64) -> Result<(), ProtocolError> {
        let total_liquidity = self.footing(timestamp)?;
        if total_liquidity.is_zero() || amount.is_zero() {
            return Ok(());
        }
        let factor = RAY + ray_div(amount, total_liquidity);
        self.liquidity_index = ray_mul(self.liquidity_index, factor);
        Ok(())
    }

    pub fn require_active(&self) -> Result<(), ProtocolError> {
        if !self.config.active {
            return Err(ProtocolError::ReserveNotActive { asset: self.asset });
        }
        Ok(())
    }

    pub fn require_not_frozen(&self) -> Result<(), ProtocolError> {
        if self.config.frozen {
            return Err(ProtocolError::ReserveFrozen { asset: self.asset });
        }
        Ok(())
    }

    pub fn require_borrowing_enabled(&self) -> Result<(), ProtocolError> {
        if !self.config.borrowing_enabled {
            return Err(ProtocolError::BorrowingDisabled { asset: self.asset });
        }
        Ok(())
    }

    fn check_timestamp(&self, timestamp: u64) -> Result<(), ProtocolError> {
        if timestamp < self.last_update_timestamp {
            return Err(ProtocolError::TimestampInPast {
                timestamp,
                last_update: self.last_update_timestamp,
            });
        }
        Ok(())
    }
}
