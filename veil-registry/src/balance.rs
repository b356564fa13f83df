//! In-memory balance source.
//!
//! Address → token balances, mirroring the read shape of the ledger's
//! balance RPC. Unknown addresses hold nothing and yield an empty list.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use veil_core::error::Result;
use veil_core::traits::{BalanceSource, CoinBalance};
use veil_core::types::LedgerAddress;

/// In-memory address → balances map.
#[derive(Debug, Default)]
pub struct MemoryBalanceSource {
    balances: DashMap<LedgerAddress, Vec<CoinBalance>>,
}

impl MemoryBalanceSource {
    /// Creates an empty balance source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits an address with an amount of a currency.
    pub fn credit(&self, address: LedgerAddress, currency_id: &str, amount: u128) {
        let mut entry = self.balances.entry(address).or_default();
        match entry.iter_mut().find(|b| b.currency_id == currency_id) {
            Some(balance) => balance.raw_amount += amount,
            None => entry.push(CoinBalance::new(currency_id, amount)),
        }
        debug!(address = %address, currency_id, amount, "Credited balance");
    }

    /// Replaces all balances held by an address.
    pub fn set_balances(&self, address: LedgerAddress, balances: Vec<CoinBalance>) {
        self.balances.insert(address, balances);
    }

    /// Removes all balances for an address.
    pub fn clear_address(&self, address: &LedgerAddress) {
        self.balances.remove(address);
    }
}

#[async_trait]
impl BalanceSource for MemoryBalanceSource {
    async fn balances(&self, address: &LedgerAddress) -> Result<Vec<CoinBalance>> {
        Ok(self
            .balances
            .get(address)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }
}
