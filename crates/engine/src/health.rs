//! Account health computation.
//!
//! Values every asset a position holds or owes through the price oracle
//! in USD-8 base units, weights collateral by each reserve's liquidation
//! threshold, and reduces the result to a single ray health factor. A
//! position with no debt has an unbounded health factor, encoded as
//! `U256::MAX`. Reads are pull-based: indices are recomputed on the fly
//! from the elapsed time, so the result is never stale even when no
//! accounting operation has committed this second.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::math::{percent_mul, ray_div, RAY};
use crate::oracle::PriceOracle;
use crate::position::Position;
use crate::reserve::Reserve;

/// A position is liquidatable strictly below this health factor (1.0 ray)
pub const HEALTH_FACTOR_LIQUIDATION_THRESHOLD: U256 = RAY;

/// Aggregated valuation of one account against the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    /// Collateral value in USD-8, unweighted
    pub total_collateral_value: U256,
    /// Debt value in USD-8
    pub total_debt_value: U256,
    /// Collateral-value-weighted liquidation threshold, bps
    pub current_liquidation_threshold_bps: u64,
    /// Collateral-value-weighted LTV bound, bps
    pub ltv_bps: u64,
    /// Risk-adjusted collateral over debt, ray. `U256::MAX` when no debt.
    pub health_factor: U256,
}

impl AccountData {
    /// True when the position can be liquidated
    pub fn is_unhealthy(&self) -> bool {
        self.health_factor < HEALTH_FACTOR_LIQUIDATION_THRESHOLD
    }

    /// Remaining LTV-bounded borrowing power in USD-8
    pub fn available_borrow_value(&self) -> U256 {
        percent_mul(self.total_collateral_value, self.ltv_bps)
            .saturating_sub(self.total_debt_value)
    }
}

/// Converts a token amount to USD-8 value
pub fn asset_value(amount: U256, price: U256, decimals: u32) -> U256 {
    amount * price / U256::from(10u64).pow(U256::from(decimals))
}

/// Converts a USD-8 value to a token amount
pub fn value_to_amount(value: U256, price: U256, decimals: u32) -> Result<U256, ProtocolError> {
    if price.is_zero() {
        return Err(ProtocolError::InvalidPrice {
            asset: Address::ZERO,
        });
    }
    Ok(value * U256::from(10u64).pow(U256::from(decimals)) / price)
}

/// Computes the aggregate account data for one position.
///
/// Every collateral and debt asset must have a live reserve and a fresh
/// oracle price; a stale price aborts the whole read.
pub fn account_data(
    reserves: &BTreeMap<Address, Reserve>,
    position: &Position,
    oracle: &impl PriceOracle,
    timestamp: u64,
) -> Result<AccountData, ProtocolError> {
    let mut total_collateral_value = U256::ZERO;
    let mut total_debt_value = U256::ZERO;
    let mut weighted_threshold = U256::ZERO;
    let mut weighted_ltv = U256::ZERO;

    for (asset, _) in position.collateral_assets() {
        let reserve = reserves
            .get(&asset)
            .ok_or(ProtocolError::UnknownReserve { asset })?;
        let balance = position.collateral_balance(reserve, timestamp)?;
        let price = oracle.get_asset_price(asset)?;
        let value = asset_value(balance, price, reserve.config.decimals);

        total_collateral_value += value;
        weighted_threshold += value * U256::from(reserve.config.liquidation_threshold_bps);
        weighted_ltv += value * U256::from(reserve.config.ltv_bps);
    }

    for (asset, _) in position.debt_assets() {
        let reserve = reserves
            .get(&asset)
            .ok_or(ProtocolError::UnknownReserve { asset })?;
        let balance = position.debt_balance(reserve, timestamp)?;
        let price = oracle.get_asset_price(asset)?;
        total_debt_value += asset_value(balance, price, reserve.config.decimals);
    }

    let (current_liquidation_threshold_bps, ltv_bps) = if total_collateral_value.is_zero() {
        (0, 0)
    } else {
        (
            (weighted_threshold / total_collateral_value).saturating_to::<u64>(),
            (weighted_ltv / total_collateral_value).saturating_to::<u64>(),
        )
    };

    let health_factor = if total_debt_value.is_zero() {
        U256::MAX
    } else {
        ray_div(
            percent_mul(total_collateral_value, current_liquidation_threshold_bps),
            total_debt_value,
        )
    };

    Ok(AccountData {
        total_collateral_value,
        total_debt_value,
        current_liquidation_threshold_bps,
        ltv_bps,
        health_factor,
    })
}
