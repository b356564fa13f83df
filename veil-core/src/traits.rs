//! External interfaces consumed by the Veil core.
//!
//! The ledger, the name registry, and the balance source are collaborators
//! outside this system; the core only ever talks to them through these
//! traits and treats them as untrusted and possibly absent.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{CompressedPublicKey, EventId, EventPage, LedgerAddress};

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

/// Paginated, ascending-ordered read access to the ledger's stealth events.
///
/// Implementations might wrap:
/// - A full-node RPC event query (production)
/// - An in-memory event log (testing/development)
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Fetches up to `limit` events strictly after `cursor`, in ascending
    /// ledger order. `None` means "from genesis".
    ///
    /// The returned page signals whether more pages follow and may carry the
    /// ledger's own token for the next fetch.
    async fn events_after(&self, cursor: Option<&EventId>, limit: usize) -> Result<EventPage>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAME REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// External name → meta public key lookup.
///
/// Used only by the name payment flow; the registry itself (registration,
/// renewal, dispute) is out of scope and treated as a key-value store.
#[async_trait]
pub trait NameRegistry: Send + Sync {
    /// Resolves a registered name to the owner's meta public key, or `None`
    /// if the name is unknown.
    async fn resolve(&self, name: &str) -> Result<Option<CompressedPublicKey>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// BALANCE SOURCE
// ═══════════════════════════════════════════════════════════════════════════════

/// A single token balance held by a ledger address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinBalance {
    /// On-ledger currency identifier (e.g. `0x2::sui::SUI`)
    pub currency_id: String,
    /// Raw amount in the currency's smallest unit
    pub raw_amount: u128,
}

impl CoinBalance {
    /// Creates a new coin balance.
    pub fn new(currency_id: impl Into<String>, raw_amount: u128) -> Self {
        Self {
            currency_id: currency_id.into(),
            raw_amount,
        }
    }
}

/// Read access to on-ledger token balances.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Returns all token balances held by `address`. Unknown addresses
    /// yield an empty list, not an error.
    async fn balances(&self, address: &LedgerAddress) -> Result<Vec<CoinBalance>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CURRENCY CATALOG
// ═══════════════════════════════════════════════════════════════════════════════

/// Display metadata for known currencies.
///
/// Used only for amount scaling in aggregation output, never for any
/// cryptographic decision.
pub trait CurrencyCatalog: Send + Sync {
    /// Returns the decimal places of a known currency, or `None` if the
    /// currency is not in the catalog (its balances are then ignored).
    fn decimals(&self, currency_id: &str) -> Option<u8>;
}
