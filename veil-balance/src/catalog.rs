//! Currency catalog and display-amount scaling.
//!
//! The catalog is display metadata only: it decides which currencies show
//! up in aggregation output and how raw amounts scale, never anything
//! cryptographic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use veil_core::traits::CurrencyCatalog;

/// A known currency.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Currency {
    /// Short display ticker (e.g. "SUI")
    pub ticker: String,
    /// Human-readable name
    pub name: String,
    /// On-ledger currency identifier
    pub currency_id: String,
    /// Decimal places of the smallest unit
    pub decimals: u8,
}

impl Currency {
    /// Creates a currency entry.
    pub fn new(
        ticker: impl Into<String>,
        name: impl Into<String>,
        currency_id: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            currency_id: currency_id.into(),
            decimals,
        }
    }
}

/// A fixed, in-process currency catalog.
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    by_id: HashMap<String, Currency>,
}

impl StaticCatalog {
    /// Builds a catalog from a list of currencies.
    pub fn new(currencies: Vec<Currency>) -> Self {
        Self {
            by_id: currencies
                .into_iter()
                .map(|c| (c.currency_id.clone(), c))
                .collect(),
        }
    }

    /// The standard mainnet coin set.
    pub fn mainnet() -> Self {
        Self::new(vec![
            Currency::new("SUI", "Sui", "0x2::sui::SUI", 9),
            Currency::new(
                "USDC",
                "USD Coin",
                "0xa1ec7fc00a6f40db9693ad1415d0c193ad3906494428cf252621037bd7117e29::usdc::USDC",
                6,
            ),
            Currency::new(
                "WAL",
                "Walrus",
                "0x8190b041122eb492bf63cb464476bd68c6b7e570a4079645a8b28732b6197a82::wal::WAL",
                9,
            ),
        ])
    }

    /// Looks up a currency by its on-ledger identifier.
    pub fn get(&self, currency_id: &str) -> Option<&Currency> {
        self.by_id.get(currency_id)
    }

    /// Returns all catalog entries.
    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.by_id.values()
    }

    /// Returns the number of known currencies.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl CurrencyCatalog for StaticCatalog {
    fn decimals(&self, currency_id: &str) -> Option<u8> {
        self.by_id.get(currency_id).map(|c| c.decimals)
    }
}

/// Scales a raw integer amount to a decimal display string.
///
/// Trailing zeros in the fractional part are trimmed; a fractional part of
/// zero is omitted entirely.
pub fn format_amount(raw: u128, decimals: u8) -> String {
    let Some(divisor) = 10u128.checked_pow(decimals as u32) else {
        return raw.to_string();
    };
    let whole = raw / divisor;
    let frac = raw % divisor;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = decimals as usize);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}
