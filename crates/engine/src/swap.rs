//! External swap venue interface.
//!
//! The engine treats the venue as an opaque, possibly-slippage-bearing
//! counterparty: it hands over an input amount and a caller-chosen
//! minimum output, and either receives at least that much of the output
//! asset or the whole enclosing operation aborts.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::ledger::Ledger;
use crate::math::percent_mul;

/// An external venue that exchanges one asset for another on the ledger.
pub trait SwapVenue {
    /// Swaps `amount_in` of `from_asset` held by `account` into
    /// `to_asset`, enforcing `min_amount_out`. Returns the output amount.
    fn swap(
        &self,
        ledger: &mut Ledger,
        account: Address,
        from_asset: Address,
        to_asset: Address,
        amount_in: U256,
        min_amount_out: U256,
    ) -> Result<U256, ProtocolError>;
}

/// Quote parameters for one asset on the reference venue
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct VenueQuote {
    /// USD-8 price of one whole unit
    pub price: U256,
    pub decimals: u32,
}

/// A reference venue that fills at posted prices minus a flat haircut.
///
/// Exists for tests and the scenario runner; a production deployment
/// would put a DEX adapter behind [`SwapVenue`] instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OraclePricedVenue {
    quotes: BTreeMap<Address, VenueQuote>,
    /// Haircut applied to the ideal output, in bps
    pub slippage_bps: u64,
}

impl OraclePricedVenue {
    pub fn new(slippage_bps: u64) -> Self {
        Self {
            quotes: BTreeMap::new(),
            slippage_bps,
        }
    }

    pub fn with_asset(mut self, asset: Address, price: U256, decimals: u32) -> Self {
        self.quotes.insert(asset, VenueQuote { price, decimals });
        self
    }

    pub fn set_price(&mut self, asset: Address, price: U256) {
        if let Some(quote) = self.quotes.get_mut(&asset) {
            quote.price = price;
        }
    }

    fn quote(&self, asset: Address) -> Result<VenueQuote, ProtocolError> {
        match self.quotes.get(&asset) {
            Some(quote) if !quote.price.is_zero() => Ok(*quote),
            _ => Err(ProtocolError::InvalidPrice { asset }),
        }
    }
}

impl SwapVenue for OraclePricedVenue {
    fn swap(
        &self,
        ledger: &mut Ledger,
        account: Address,
        from_asset: Address,
        to_asset: Address,
        amount_in: U256,
        min_amount_out: U256,
    ) -> Result<U256, ProtocolError> {
        let from = self.quote(from_asset)?;
        let to = self.quote(to_asset)?;

        let ideal_out = amount_in * from.price * U256::from(10u64).pow(U256::from(to.decimals))
            / (U256::from(10u64).pow(U256::from(from.decimals)) * to.price);
        let amount_out = percent_mul(ideal_out, 10_000 - self.slippage_bps);

        if amount_out < min_amount_out {
            return Err(ProtocolError::SlippageExceeded {
                min_out: min_amount_out,
                actual: amount_out,
            });
        }

        // Checks passed: settle both legs against the ledger
        ledger.burn(from_asset, account, amount_in)?;
        ledger.mint(to_asset, account, amount_out);
        Ok(amount_out)
    }
}
