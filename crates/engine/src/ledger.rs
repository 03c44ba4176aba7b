//! In-memory asset-transfer service.
//!
//! The engine never assumes push-based notification: it always initiates
//! pulls and pushes explicitly and checks balances itself. This ledger is
//! the ERC20-equivalent external service behind that interface, modeled
//! in-memory so state snapshots stay self-contained.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Balances and allowances for every asset the protocol touches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// (asset, holder) -> balance
    balances: HashMap<Address, HashMap<Address, U256>>,
    /// asset -> owner -> spender -> allowance
    allowances: HashMap<Address, HashMap<Address, HashMap<Address, U256>>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the balance of `account` in `asset`
    pub fn balance_of(&self, asset: Address, account: Address) -> U256 {
        self.balances
            .get(&asset)
            .and_then(|m| m.get(&account))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Returns the allowance granted by `owner` to `spender` on `asset`
    pub fn allowance(&self, asset: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&asset)
            .and_then(|m| m.get(&owner))
            .and_then(|m| m.get(&spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Credits `amount` of `asset` to `account` out of thin air.
    /// Test and bootstrap use only; real supply enters via deposits.
    pub fn mint(&mut self, asset: Address, account: Address, amount: U256) {
        let entry = self
            .balances
            .entry(asset)
            .or_default()
            .entry(account)
            .or_insert(U256::ZERO);
        *entry += amount;
    }

    /// Burns `amount` of `asset` from `account`
    pub fn burn(
        &mut self,
        asset: Address,
        account: Address,
        amount: U256,
    ) -> Result<(), ProtocolError> {
        let balance = self.balance_of(asset, account);
        if balance < amount {
            return Err(ProtocolError::InsufficientBalance {
                asset,
                account,
                requested: amount,
                available: balance,
            });
        }
        self.balances
            .entry(asset)
            .or_default()
            .insert(account, balance - amount);
        Ok(())
    }

    /// Grants `spender` an allowance of `amount` on `owner`'s `asset`
    pub fn approve(&mut self, asset: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances
            .entry(asset)
            .or_default()
            .entry(owner)
            .or_default()
            .insert(spender, amount);
    }

    /// Moves `amount` of `asset` from `from` to `to`
    pub fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ProtocolError> {
        self.burn(asset, from, amount)?;
        self.mint(asset, to, amount);
        Ok(())
    }

    /// Pulls `amount` of `asset` from `owner` to `to`, consuming the
    /// allowance `owner` granted to `spender`
    pub fn transfer_from(
        &mut self,
        asset: Address,
        spender: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ProtocolError> {
        let allowed = self.allowance(asset, owner, spender);
        if allowed < amount {
            return Err(ProtocolError::InsufficientAllowance {
                asset,
                owner,
                spender,
            });
        }
        self.transfer(asset, owner, to, amount)?;
        self.allowances
            .entry(asset)
            .or_default()
            .entry(owner)
            .or_default()
            .insert(spender, allowed - amount);
        Ok(())
    }
}
