//! Scaled per-account balances against the pool.
//!
//! Collateral is stored scaled down by the liquidity index at deposit
//! time, debt scaled by the variable borrow index, so interest accrues
//! implicitly as the indices grow. One `Position` exists per account
//! address, whether that account is a plain supplier or a loan vault.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::math::ray_mul;
use crate::reserve::Reserve;

/// Aggregate of everything one account holds against or owes to the pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    collateral_scaled: BTreeMap<Address, U256>,
    debt_scaled: BTreeMap<Address, U256>,
}

impl Position {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the account holds no collateral and owes nothing
    pub fn is_empty(&self) -> bool {
        self.collateral_scaled.values().all(U256::is_zero)
            && self.debt_scaled.values().all(U256::is_zero)
    }

    /// Assets this position holds as collateral, in address order
    pub fn collateral_assets(&self) -> impl Iterator<Item = (Address, U256)> + '_ {
        self.collateral_scaled
            .iter()
            .filter(|(_, scaled)| !scaled.is_zero())
            .map(|(asset, scaled)| (*asset, *scaled))
    }

    /// Assets this position has borrowed, in address order
    pub fn debt_assets(&self) -> impl Iterator<Item = (Address, U256)> + '_ {
        self.debt_scaled
            .iter()
            .filter(|(_, scaled)| !scaled.is_zero())
            .map(|(asset, scaled)| (*asset, *scaled))
    }

    pub fn collateral_scaled(&self, asset: Address) -> U256 {
        self.collateral_scaled
            .get(&asset)
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn debt_scaled(&self, asset: Address) -> U256 {
        self.debt_scaled.get(&asset).copied().unwrap_or(U256::ZERO)
    }

    /// Current collateral balance in token units
    pub fn collateral_balance(
        &self,
        reserve: &Reserve,
        timestamp: u64,
    ) -> Result<U256, ProtocolError> {
        Ok(ray_mul(
            self.collateral_scaled(reserve.asset),
            reserve.normalized_income(timestamp)?,
        ))
    }

    /// Current debt balance in token units
    pub fn debt_balance(&self, reserve: &Reserve, timestamp: u64) -> Result<U256, ProtocolError> {
        Ok(ray_mul(
            self.debt_scaled(reserve.asset),
            reserve.normalized_debt(timestamp)?,
        ))
    }

    pub fn add_collateral_scaled(&mut self, asset: Address, scaled: U256) {
        *self.collateral_scaled.entry(asset).or_insert(U256::ZERO) += scaled;
    }

    pub fn sub_collateral_scaled(
        &mut self,
        asset: Address,
        scaled: U256,
    ) -> Result<(), ProtocolError> {
        let balance = self.collateral_scaled(asset);
        let remaining = balance
            .checked_sub(scaled)
            .ok_or(ProtocolError::BalanceUnderflow {
                asset,
                balance,
                delta: scaled,
            })?;
        self.collateral_scaled.insert(asset, remaining);
        Ok(())
    }

    pub fn add_debt_scaled(&mut self, asset: Address, scaled: U256) {
        *self.debt_scaled.entry(asset).or_insert(U256::ZERO) += scaled;
    }

    pub fn sub_debt_scaled(&mut self, asset: Address, scaled: U256) -> Result<(), ProtocolError> {
        let balance = self.debt_scaled(asset);
        let remaining = balance
            .checked_sub(scaled)
            .ok_or(ProtocolError::BalanceUnderflow {
                asset,
                balance,
                delta: scaled,
            })?;
        self.debt_scaled.insert(asset, remaining);
        Ok(())
    }

    /// Clears the debt entry entirely: used when a repay settles the last
    /// unit so index rounding never strands dust
    pub fn clear_debt(&mut self, asset: Address) {
        self.debt_scaled.insert(asset, U256::ZERO);
    }
}
