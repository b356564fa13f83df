//! Balance aggregation over recovered accounts.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use veil_core::error::Result;
use veil_core::traits::{BalanceSource, CurrencyCatalog};
use veil_core::types::LedgerAddress;
use veil_stealth::MetaAccountStore;

use crate::catalog::format_amount;

/// One currency held by one recovered account.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The recovered one-time address holding the funds
    pub address: LedgerAddress,
    /// On-ledger currency identifier
    pub currency_id: String,
    /// Raw amount in the currency's smallest unit
    pub raw_amount: u128,
    /// Decimal-scaled display amount
    pub display_amount: String,
}

/// Sum of one currency across all recovered accounts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrencyTotal {
    /// On-ledger currency identifier
    pub currency_id: String,
    /// Raw total in the currency's smallest unit
    pub raw_total: u128,
    /// Decimal-scaled display total
    pub display_total: String,
}

/// Aggregated balances for one identity.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BalanceSummary {
    /// Per-currency totals, ordered by currency id
    pub totals: Vec<CurrencyTotal>,
    /// Per-account breakdown; zero balances and unknown currencies omitted
    pub breakdown: Vec<AccountBalance>,
}

impl BalanceSummary {
    /// Returns the total for a currency, if any was found.
    pub fn total_for(&self, currency_id: &str) -> Option<&CurrencyTotal> {
        self.totals.iter().find(|t| t.currency_id == currency_id)
    }

    /// Returns true if no relevant balances were found.
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Read-only balance view over an identity's recovered accounts.
pub struct BalanceAggregator {
    store: Arc<MetaAccountStore>,
    source: Arc<dyn BalanceSource>,
    catalog: Arc<dyn CurrencyCatalog>,
}

impl BalanceAggregator {
    /// Creates an aggregator.
    pub fn new(
        store: Arc<MetaAccountStore>,
        source: Arc<dyn BalanceSource>,
        catalog: Arc<dyn CurrencyCatalog>,
    ) -> Self {
        Self {
            store,
            source,
            catalog,
        }
    }

    /// Queries every recovered account and rolls balances up per currency.
    ///
    /// Currencies missing from the catalog are ignored; accounts holding
    /// nothing relevant are absent from the breakdown.
    ///
    /// # Errors
    /// - [`veil_core::VeilError::NoMetaKey`] for an unknown identity
    /// - [`veil_core::VeilError::BalanceSource`] if the source fails
    #[instrument(skip(self))]
    pub async fn aggregate(&self, identity: &str) -> Result<BalanceSummary> {
        let accounts = self.store.recovered_accounts(identity)?;
        debug!(identity, accounts = accounts.len(), "Aggregating balances");

        let queries = accounts.iter().map(|a| self.source.balances(&a.address));
        let results = future::try_join_all(queries).await?;

        let mut totals: BTreeMap<String, u128> = BTreeMap::new();
        let mut breakdown = Vec::new();

        for (account, balances) in accounts.iter().zip(results) {
            for balance in balances {
                let Some(decimals) = self.catalog.decimals(&balance.currency_id) else {
                    continue;
                };
                if balance.raw_amount == 0 {
                    continue;
                }

                *totals.entry(balance.currency_id.clone()).or_default() += balance.raw_amount;
                breakdown.push(AccountBalance {
                    address: account.address,
                    display_amount: format_amount(balance.raw_amount, decimals),
                    currency_id: balance.currency_id,
                    raw_amount: balance.raw_amount,
                });
            }
        }

        let totals = totals
            .into_iter()
            .map(|(currency_id, raw_total)| {
                let decimals = self.catalog.decimals(&currency_id).unwrap_or(0);
                CurrencyTotal {
                    display_total: format_amount(raw_total, decimals),
                    currency_id,
                    raw_total,
                }
            })
            .collect();

        Ok(BalanceSummary { totals, breakdown })
    }
}

impl std::fmt::Debug for BalanceAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceAggregator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use veil_core::error::VeilError;
    use veil_core::types::{EventId, OneTimePrivateKey, RecoveredAccount};
    use veil_registry::MemoryBalanceSource;

    const SUI: &str = "0x2::sui::SUI";
    const USDC: &str =
        "0xa1ec7fc00a6f40db9693ad1415d0c193ad3906494428cf252621037bd7117e29::usdc::USDC";

    fn setup() -> (Arc<MetaAccountStore>, Arc<MemoryBalanceSource>, BalanceAggregator) {
        let store = Arc::new(MetaAccountStore::new());
        store.generate(b"balance-seed", "a").unwrap();
        let source = Arc::new(MemoryBalanceSource::new());
        let aggregator = BalanceAggregator::new(
            store.clone(),
            source.clone(),
            Arc::new(StaticCatalog::mainnet()),
        );
        (store, source, aggregator)
    }

    fn record_account(store: &MetaAccountStore, byte: u8) -> LedgerAddress {
        let address = LedgerAddress::from_array([byte; 32]);
        store
            .record_recovered(
                "a",
                RecoveredAccount::new(
                    address,
                    OneTimePrivateKey::from_array([byte; 32]),
                    EventId::new(format!("ev-{byte}")),
                ),
            )
            .unwrap();
        address
    }

    #[tokio::test]
    async fn test_empty_identity_has_empty_summary() {
        let (_store, _source, aggregator) = setup();
        let summary = aggregator.aggregate("a").await.unwrap();
        assert!(summary.is_empty());
        assert!(summary.breakdown.is_empty());
    }

    #[tokio::test]
    async fn test_totals_sum_across_accounts() {
        let (store, source, aggregator) = setup();
        let addr1 = record_account(&store, 1);
        let addr2 = record_account(&store, 2);

        source.credit(addr1, SUI, 1_500_000_000);
        source.credit(addr2, SUI, 500_000_000);
        source.credit(addr2, USDC, 2_000_000);

        let summary = aggregator.aggregate("a").await.unwrap();

        let sui = summary.total_for(SUI).unwrap();
        assert_eq!(sui.raw_total, 2_000_000_000);
        assert_eq!(sui.display_total, "2");

        let usdc = summary.total_for(USDC).unwrap();
        assert_eq!(usdc.raw_total, 2_000_000);
        assert_eq!(usdc.display_total, "2");

        assert_eq!(summary.breakdown.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_currencies_are_filtered() {
        let (store, source, aggregator) = setup();
        let addr = record_account(&store, 1);

        source.credit(addr, "0x999::spam::SPAM", 1_000_000);
        source.credit(addr, SUI, 7);

        let summary = aggregator.aggregate("a").await.unwrap();
        assert_eq!(summary.totals.len(), 1);
        assert_eq!(summary.total_for(SUI).unwrap().raw_total, 7);
    }

    #[tokio::test]
    async fn test_zero_balances_omitted_from_breakdown() {
        let (store, source, aggregator) = setup();
        let addr1 = record_account(&store, 1);
        let addr2 = record_account(&store, 2);

        source.set_balances(addr1, vec![veil_core::traits::CoinBalance::new(SUI, 0)]);
        source.credit(addr2, SUI, 10);

        let summary = aggregator.aggregate("a").await.unwrap();
        assert_eq!(summary.breakdown.len(), 1);
        assert_eq!(summary.breakdown[0].address, addr2);
    }

    #[tokio::test]
    async fn test_unknown_identity_errors() {
        let (_store, _source, aggregator) = setup();
        let result = aggregator.aggregate("nobody").await;
        assert!(matches!(result, Err(VeilError::NoMetaKey(_))));
    }
}
