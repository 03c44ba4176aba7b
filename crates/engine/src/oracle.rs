//! Price oracle interface.
//!
//! Prices are quoted in the protocol base currency (USD, 8 decimals).
//! A zero or missing price must abort the caller rather than let a stale
//! valuation through.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Number of decimals in oracle price quotes (USD-8)
pub const PRICE_DECIMALS: u32 = 8;

/// Read-only price source for collateral and debt valuation.
pub trait PriceOracle {
    /// Returns the USD-8 price of one whole unit of `asset`.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidPrice`] when the feed has no usable price.
    fn get_asset_price(&self, asset: Address) -> Result<U256, ProtocolError>;
}

/// A table-driven oracle fed by an operator (or a test).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticPriceOracle {
    prices: HashMap<Address, U256>,
}

impl StaticPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the price for `asset`. A zero price marks the feed stale:
    /// subsequent reads fail until a fresh price lands.
    pub fn set_price(&mut self, asset: Address, price: U256) {
        self.prices.insert(asset, price);
    }
}

impl PriceOracle for StaticPriceOracle {
    fn get_asset_price(&self, asset: Address) -> Result<U256, ProtocolError> {
        match self.prices.get(&asset) {
            Some(price) if !price.is_zero() => Ok(*price),
            _ => Err(ProtocolError::InvalidPrice { asset }),
        }
    }
}
