//! Vault factory and escrow.
//!
//! Each borrower-loan pair gets an isolated position holder (the LSA) so
//! one borrower's default cannot cross-contaminate another's. Vaults are
//! created lazily, reused across a borrower's successive loans, and never
//! serve two live loans at once. The escrow parks interest-bearing
//! collateral receipts seized from insured positions until the insurance
//! pathway settles them.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Bookkeeping for one vault (LSA).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultMeta {
    pub borrower: Address,
    /// A live loan currently occupies this vault
    pub in_use: bool,
    /// Reentrancy guard: a loan-management operation is mid-flight
    pub busy: bool,
    pub created_at: u64,
}

/// Registry of vaults and their borrower ownership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultRegistry {
    vaults: BTreeMap<Address, VaultMeta>,
    by_borrower: BTreeMap<Address, Vec<Address>>,
    next_id: u64,
}

/// Vault addresses live in a reserved namespace derived from a counter,
/// so they can never collide with user or asset addresses.
fn derive_vault_address(id: u64) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xB1;
    bytes[1] = 0x70;
    bytes[12..].copy_from_slice(&id.to_be_bytes());
    Address::from(bytes)
}

impl VaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a free vault for `borrower`, creating one if every existing
    /// vault of theirs is occupied.
    pub fn obtain(&mut self, borrower: Address, timestamp: u64) -> Address {
        if let Some(free) = self
            .by_borrower
            .get(&borrower)
            .into_iter()
            .flatten()
            .find(|vault| self.vaults.get(*vault).is_some_and(|meta| !meta.in_use))
        {
            return *free;
        }

        self.next_id += 1;
        let vault = derive_vault_address(self.next_id);
        self.vaults.insert(
            vault,
            VaultMeta {
                borrower,
                in_use: false,
                busy: false,
                created_at: timestamp,
            },
        );
        self.by_borrower.entry(borrower).or_default().push(vault);
        vault
    }

    pub fn get(&self, vault: Address) -> Option<&VaultMeta> {
        self.vaults.get(&vault)
    }

    /// All vaults ever created for `borrower`, in creation order
    pub fn vaults_of(&self, borrower: Address) -> &[Address] {
        self.by_borrower
            .get(&borrower)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Marks the vault occupied by a live loan
    pub fn occupy(&mut self, vault: Address) {
        if let Some(meta) = self.vaults.get_mut(&vault) {
            meta.in_use = true;
        }
    }

    /// Logically retires the vault once its loan is terminal
    pub fn release(&mut self, vault: Address) {
        if let Some(meta) = self.vaults.get_mut(&vault) {
            meta.in_use = false;
        }
    }

    /// Takes the reentrancy guard for a loan-management operation.
    /// The guard stays held until [`Self::end_operation`]; a nested entry
    /// fails instead of observing half-restored invariants.
    pub fn begin_operation(&mut self, vault: Address) -> Result<(), ProtocolError> {
        match self.vaults.get_mut(&vault) {
            Some(meta) if meta.busy => Err(ProtocolError::VaultBusy { vault }),
            Some(meta) => {
                meta.busy = true;
                Ok(())
            }
            None => Err(ProtocolError::LoanNotFound { vault }),
        }
    }

    /// Releases the reentrancy guard
    pub fn end_operation(&mut self, vault: Address) {
        if let Some(meta) = self.vaults.get_mut(&vault) {
            meta.busy = false;
        }
    }
}

/// One parked seizure awaiting insurance settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowEntry {
    pub vault: Address,
    pub asset: Address,
    /// Liquidity-index-scaled receipt; keeps earning supplier interest
    pub scaled_amount: U256,
    pub insurance_id: u64,
    pub seized_at: u64,
}

/// Holding area for collateral seized from insured positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Escrow {
    entries: Vec<EscrowEntry>,
}

impl Escrow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hold(
        &mut self,
        vault: Address,
        asset: Address,
        scaled_amount: U256,
        insurance_id: u64,
        seized_at: u64,
    ) {
        self.entries.push(EscrowEntry {
            vault,
            asset,
            scaled_amount,
            insurance_id,
            seized_at,
        });
    }

    pub fn entries(&self) -> &[EscrowEntry] {
        &self.entries
    }

    pub fn entries_for(&self, vault: Address) -> impl Iterator<Item = &EscrowEntry> {
        self.entries.iter().filter(move |e| e.vault == vault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_obtain_reuses_free_vault() {
        let mut registry = VaultRegistry::new();
        let borrower = addr(1);

        let first = registry.obtain(borrower, 100);
        assert_eq!(registry.obtain(borrower, 200), first);

        registry.occupy(first);
        let second = registry.obtain(borrower, 300);
        assert_ne!(second, first);

        registry.release(first);
        assert_eq!(registry.obtain(borrower, 400), first);
    }

    #[test]
    fn test_vaults_are_isolated_per_borrower() {
        let mut registry = VaultRegistry::new();
        let a = registry.obtain(addr(1), 0);
        registry.occupy(a);
        let b = registry.obtain(addr(2), 0);
        assert_ne!(a, b);
        assert_eq!(registry.vaults_of(addr(1)), &[a]);
        assert_eq!(registry.vaults_of(addr(2)), &[b]);
    }

    #[test]
    fn test_reentrancy_guard() {
        let mut registry = VaultRegistry::new();
        let vault = registry.obtain(addr(1), 0);

        registry.begin_operation(vault).unwrap();
        assert!(matches!(
            registry.begin_operation(vault),
            Err(ProtocolError::VaultBusy { .. })
        ));

        registry.end_operation(vault);
        registry.begin_operation(vault).unwrap();
    }

    #[test]
    fn test_escrow_records() {
        let mut escrow = Escrow::new();
        escrow.hold(addr(1), addr(0xBB), U256::from(500), 7, 1_000);
        assert_eq!(escrow.entries_for(addr(1)).count(), 1);
        assert_eq!(escrow.entries_for(addr(2)).count(), 0);
    }
}
