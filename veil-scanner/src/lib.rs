//! # Veil Scanner
//!
//! Cursor-resumable sync of the ledger's stealth event stream.
//!
//! For every event the engine re-derives the expected one-time key from the
//! identity's meta private key and records a recovered account only when the
//! derived address equals the address carried by the event. False positives
//! are structurally impossible; a non-matching event is simply skipped.
//!
//! ## State machine
//!
//! `Idle → Scanning → Idle` per identity, entered by an explicit [`SyncEngine::sync`]
//! call. A request arriving while the identity is already `Scanning` is
//! coalesced (reported as [`SyncOutcome::Coalesced`]), never run twice
//! concurrently. Syncs for different identities are independent.
//!
//! ## Cursor discipline
//!
//! The in-memory cursor advances per page; the store is checkpointed at page
//! boundaries so an aborted pass resumes from the last fully processed page.
//! The completion timestamp is only written after the final page. A fetch
//! failure or timeout aborts the pass without touching the checkpoint.
//!
//! ## Example
//!
//! ```rust,ignore
//! use veil_scanner::{SyncEngine, SyncOutcome};
//!
//! let engine = SyncEngine::new(store, ledger);
//! match engine.sync("wallet-a").await? {
//!     SyncOutcome::Completed(report) => println!("{} new accounts", report.new_accounts),
//!     SyncOutcome::Coalesced => println!("already scanning"),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use veil_core::constants::{DEFAULT_PAGE_SIZE, DEFAULT_PAGE_TIMEOUT_SECS};
use veil_core::error::{Result, VeilError};
use veil_core::traits::LedgerSource;
use veil_core::types::{EventId, EventPage, RecoveredAccount, SyncCursor};
use veil_crypto::recover_stealth_private;
use veil_stealth::MetaAccountStore;

// ═══════════════════════════════════════════════════════════════════════════════
// CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Sync engine configuration.
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Events per ledger page request
    pub page_size: usize,
    /// Timeout for a single page fetch; `None` disables the timeout
    pub page_timeout: Option<Duration>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_timeout: Some(Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS)),
        }
    }
}

impl SyncConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the per-page fetch timeout.
    pub fn page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = Some(timeout);
        self
    }

    /// Disables the per-page fetch timeout.
    pub fn no_page_timeout(mut self) -> Self {
        self.page_timeout = None;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTCOME & REPORT
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a sync request.
#[derive(Debug)]
pub enum SyncOutcome {
    /// A full pass ran to completion.
    Completed(SyncReport),
    /// Another pass was already in flight for this identity; nothing ran.
    Coalesced,
}

impl SyncOutcome {
    /// Returns true if the request was coalesced into an in-flight pass.
    pub fn is_coalesced(&self) -> bool {
        matches!(self, SyncOutcome::Coalesced)
    }

    /// Returns the report if a pass completed.
    pub fn report(self) -> Option<SyncReport> {
        match self {
            SyncOutcome::Completed(report) => Some(report),
            SyncOutcome::Coalesced => None,
        }
    }
}

/// Summary of one completed sync pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SyncReport {
    /// Ledger pages fetched
    pub pages: u32,
    /// Events scanned
    pub events_scanned: u64,
    /// Events skipped as malformed (invalid point bytes etc.)
    pub skipped: u64,
    /// Newly recovered accounts (idempotent re-discoveries excluded)
    pub new_accounts: u64,
    /// Wall-clock duration of the pass in milliseconds
    pub duration_ms: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLE-FLIGHT GUARD
// ═══════════════════════════════════════════════════════════════════════════════

/// RAII marker for an in-flight scan; releases the identity on drop, error
/// paths included.
struct SyncGuard<'a> {
    in_flight: &'a DashMap<String, ()>,
    identity: String,
}

impl<'a> SyncGuard<'a> {
    fn acquire(in_flight: &'a DashMap<String, ()>, identity: &str) -> Option<Self> {
        use dashmap::mapref::entry::Entry;
        match in_flight.entry(identity.to_owned()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                vacant.insert(());
                Some(Self {
                    in_flight,
                    identity: identity.to_owned(),
                })
            }
        }
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.identity);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNC ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// The chain sync engine.
///
/// Shared by reference across triggers (timer ticks, user actions); all
/// state lives in the account store or behind the per-identity guard map.
pub struct SyncEngine {
    store: Arc<MetaAccountStore>,
    ledger: Arc<dyn LedgerSource>,
    config: SyncConfig,
    in_flight: DashMap<String, ()>,
}

impl SyncEngine {
    /// Creates an engine with the default configuration.
    pub fn new(store: Arc<MetaAccountStore>, ledger: Arc<dyn LedgerSource>) -> Self {
        Self::with_config(store, ledger, SyncConfig::default())
    }

    /// Creates an engine with a custom configuration.
    pub fn with_config(
        store: Arc<MetaAccountStore>,
        ledger: Arc<dyn LedgerSource>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            config,
            in_flight: DashMap::new(),
        }
    }

    /// Returns true if a pass is currently in flight for the identity.
    pub fn is_syncing(&self, identity: &str) -> bool {
        self.in_flight.contains_key(identity)
    }

    /// Runs one sync pass for an identity.
    ///
    /// Idempotent: with no new ledger events, a pass leaves the recovered
    /// set and cursor position unchanged. Safe to trigger from a timer; a
    /// request for an identity that is already scanning returns
    /// [`SyncOutcome::Coalesced`] immediately.
    ///
    /// # Errors
    /// - [`VeilError::NoMetaKey`] if the identity has no generated key
    /// - [`VeilError::LedgerIo`] / [`VeilError::LedgerTimeout`] if a page
    ///   fetch fails; the pass aborts without advancing past the last
    ///   checkpoint, and the next sync resumes from there
    #[instrument(skip(self))]
    pub async fn sync(&self, identity: &str) -> Result<SyncOutcome> {
        let _guard = match SyncGuard::acquire(&self.in_flight, identity) {
            Some(guard) => guard,
            None => {
                debug!(identity, "Sync already in flight, coalescing");
                return Ok(SyncOutcome::Coalesced);
            }
        };

        let started = Instant::now();
        let keys = self.store.meta_keypair(identity)?;
        let persisted = self.store.cursor(identity)?;
        let prior_synced_at = persisted.last_synced_at;
        let mut cursor = persisted.last_event_id;
        let mut report = SyncReport::default();

        loop {
            let page = self.fetch_page(cursor.as_ref()).await?;
            report.pages += 1;

            for event in &page.events {
                report.events_scanned += 1;

                if event.validate().is_err() {
                    report.skipped += 1;
                    continue;
                }

                match recover_stealth_private(&keys.private, &event.ephemeral_pub) {
                    Ok(recovered) => {
                        // Equality against the freshly re-derived address is
                        // the only acceptance test for a match
                        if recovered.address == event.resulting_address {
                            let account = RecoveredAccount::new(
                                recovered.address,
                                recovered.private_key,
                                event.id.clone(),
                            );
                            if self.store.record_recovered(identity, account)? {
                                report.new_accounts += 1;
                                info!(
                                    identity,
                                    address = %event.resulting_address,
                                    "Recovered stealth account"
                                );
                            }
                        }
                    }
                    Err(e) if e.is_crypto_error() => {
                        report.skipped += 1;
                        debug!(identity, event = %event.id, error = %e, "Skipping malformed event");
                    }
                    Err(e) => return Err(e),
                }
            }

            // Advance: prefer the ledger's own token, fall back to the last
            // processed event, and never rewind on an empty page
            let last_processed = page.events.last().map(|e| e.id.clone());
            cursor = page.next_cursor.or(last_processed).or(cursor);

            if page.has_next {
                // Checkpoint so an aborted pass resumes at this page boundary
                self.store.set_cursor(
                    identity,
                    SyncCursor {
                        last_event_id: cursor.clone(),
                        last_synced_at: prior_synced_at,
                    },
                )?;
            } else {
                self.store.set_cursor(
                    identity,
                    SyncCursor {
                        last_event_id: cursor.clone(),
                        last_synced_at: Some(Utc::now()),
                    },
                )?;
                break;
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            identity,
            pages = report.pages,
            scanned = report.events_scanned,
            skipped = report.skipped,
            new_accounts = report.new_accounts,
            duration_ms = report.duration_ms,
            "Sync complete"
        );

        Ok(SyncOutcome::Completed(report))
    }

    /// Re-triggers `sync` on a fixed interval until the returned handle is
    /// aborted. Errors are logged and the loop keeps ticking; the
    /// single-flight guard absorbs overlap with manual triggers.
    pub fn spawn_interval(
        self: &Arc<Self>,
        identity: String,
        period: Duration,
    ) -> tokio::task::JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = engine.sync(&identity).await {
                    warn!(identity, error = %e, "Periodic sync failed");
                }
            }
        })
    }

    async fn fetch_page(&self, cursor: Option<&EventId>) -> Result<EventPage> {
        let fetch = self.ledger.events_after(cursor, self.config.page_size);
        match self.config.page_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetch)
                .await
                .map_err(|_| VeilError::LedgerTimeout {
                    seconds: timeout.as_secs(),
                })?,
            None => fetch.await,
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use veil_core::types::{CompressedPublicKey, LedgerAddress};
    use veil_crypto::{public_from_scalar, random_scalar};
    use veil_registry::MemoryLedger;
    use veil_stealth::{pay_to_public_key, pay_to_receiving_address};

    const IDENTITY: &str = "wallet-a";

    fn setup() -> (Arc<MetaAccountStore>, Arc<MemoryLedger>) {
        let store = Arc::new(MetaAccountStore::new());
        store.generate(b"wallet-A-sig", IDENTITY).unwrap();
        (store, Arc::new(MemoryLedger::new()))
    }

    /// Publishes a payment addressed to the identity and returns its address.
    fn publish_match(store: &MetaAccountStore, ledger: &MemoryLedger) -> LedgerAddress {
        let owner_pub = store.meta_public_key(IDENTITY).unwrap();
        let payment = pay_to_public_key(&owner_pub).unwrap();
        ledger
            .publish(payment.ephemeral_pub, payment.address)
            .unwrap();
        payment.address
    }

    /// Publishes a payment addressed to some unrelated owner.
    fn publish_non_match(ledger: &MemoryLedger) {
        let other_pub = public_from_scalar(&random_scalar()).unwrap();
        let payment = pay_to_public_key(&other_pub).unwrap();
        ledger
            .publish(payment.ephemeral_pub, payment.address)
            .unwrap();
    }

    /// Ledger wrapper that fails the Nth fetch (1-based) once.
    struct FailingLedger {
        inner: Arc<MemoryLedger>,
        fail_on: usize,
        fetches: AtomicUsize,
    }

    impl FailingLedger {
        fn new(inner: Arc<MemoryLedger>, fail_on: usize) -> Self {
            Self {
                inner,
                fail_on,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LedgerSource for FailingLedger {
        async fn events_after(&self, cursor: Option<&EventId>, limit: usize) -> Result<EventPage> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.fail_on {
                return Err(VeilError::LedgerIo("simulated page fetch failure".into()));
            }
            self.inner.events_after(cursor, limit).await
        }
    }

    /// Ledger wrapper that delays every fetch.
    struct SlowLedger {
        inner: Arc<MemoryLedger>,
        delay: Duration,
    }

    #[async_trait]
    impl LedgerSource for SlowLedger {
        async fn events_after(&self, cursor: Option<&EventId>, limit: usize) -> Result<EventPage> {
            tokio::time::sleep(self.delay).await;
            self.inner.events_after(cursor, limit).await
        }
    }

    #[tokio::test]
    async fn test_full_payment_cycle() {
        let (store, ledger) = setup();
        let expected = publish_match(&store, &ledger);

        let engine = SyncEngine::new(store.clone(), ledger);
        let report = engine.sync(IDENTITY).await.unwrap().report().unwrap();

        assert_eq!(report.new_accounts, 1);
        let accounts = store.recovered_accounts(IDENTITY).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].address, expected);
    }

    #[tokio::test]
    async fn test_direct_address_flow_is_discoverable() {
        let (store, ledger) = setup();
        let text = store.receiving_address(IDENTITY).unwrap().encode();

        let payment = pay_to_receiving_address(&text).unwrap();
        ledger
            .publish(payment.ephemeral_pub, payment.address)
            .unwrap();

        let engine = SyncEngine::new(store.clone(), ledger);
        engine.sync(IDENTITY).await.unwrap();

        let accounts = store.recovered_accounts(IDENTITY).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].address, payment.address);
    }

    #[tokio::test]
    async fn test_non_matching_events_are_skipped_silently() {
        let (store, ledger) = setup();
        for _ in 0..10 {
            publish_non_match(&ledger);
        }
        publish_match(&store, &ledger);

        let engine = SyncEngine::new(store.clone(), ledger);
        let report = engine.sync(IDENTITY).await.unwrap().report().unwrap();

        assert_eq!(report.events_scanned, 11);
        assert_eq!(report.new_accounts, 1);
        assert_eq!(report.skipped, 0); // non-matches are not "skipped", just not matches
        assert_eq!(store.recovered_count(IDENTITY).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sync_idempotence() {
        let (store, ledger) = setup();
        publish_match(&store, &ledger);

        let engine = SyncEngine::new(store.clone(), ledger);
        engine.sync(IDENTITY).await.unwrap();

        let accounts_before = store.recovered_count(IDENTITY).unwrap();
        let cursor_before = store.cursor(IDENTITY).unwrap().last_event_id;

        let report = engine.sync(IDENTITY).await.unwrap().report().unwrap();

        assert_eq!(report.new_accounts, 0);
        assert_eq!(store.recovered_count(IDENTITY).unwrap(), accounts_before);
        assert_eq!(store.cursor(IDENTITY).unwrap().last_event_id, cursor_before);
    }

    #[tokio::test]
    async fn test_no_meta_key_is_an_error() {
        let (store, ledger) = setup();
        let engine = SyncEngine::new(store, ledger);
        let result = engine.sync("unknown").await;
        assert!(matches!(result, Err(VeilError::NoMetaKey(_))));
    }

    #[tokio::test]
    async fn test_concurrent_sync_is_coalesced() {
        let (store, ledger) = setup();
        publish_match(&store, &ledger);

        let slow = Arc::new(SlowLedger {
            inner: ledger,
            delay: Duration::from_millis(100),
        });
        let engine = Arc::new(SyncEngine::new(store, slow));

        let first = engine.clone();
        let second = engine.clone();
        let (a, b) = tokio::join!(
            tokio::spawn(async move { first.sync(IDENTITY).await.unwrap() }),
            async move {
                // Let the first request take the guard
                tokio::time::sleep(Duration::from_millis(20)).await;
                second.sync(IDENTITY).await.unwrap()
            }
        );

        let a = a.unwrap();
        assert!(!a.is_coalesced());
        assert!(b.is_coalesced());
    }

    #[tokio::test]
    async fn test_syncs_for_different_identities_run_independently() {
        let (store, ledger) = setup();
        store.generate(b"wallet-B-sig", "wallet-b").unwrap();
        publish_match(&store, &ledger);

        let engine = Arc::new(SyncEngine::new(store.clone(), ledger));
        let (a, b) = tokio::join!(engine.sync(IDENTITY), engine.sync("wallet-b"));

        assert!(!a.unwrap().is_coalesced());
        assert!(!b.unwrap().is_coalesced());
        assert_eq!(store.recovered_count(IDENTITY).unwrap(), 1);
        assert_eq!(store.recovered_count("wallet-b").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_page_timeout_aborts_without_advancing() {
        let (store, ledger) = setup();
        publish_match(&store, &ledger);

        let slow = Arc::new(SlowLedger {
            inner: ledger,
            delay: Duration::from_millis(200),
        });
        let config = SyncConfig::new().page_timeout(Duration::from_millis(20));
        let engine = SyncEngine::with_config(store.clone(), slow, config);

        let result = engine.sync(IDENTITY).await;
        assert!(matches!(result, Err(VeilError::LedgerTimeout { .. })));
        assert!(store.cursor(IDENTITY).unwrap().is_genesis());
        assert_eq!(store.recovered_count(IDENTITY).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_paginated_scan_resumes_after_failure() {
        let (store, ledger) = setup();

        // 2500 events across 3 pages of 1000; matches planted on every page
        let mut planted = Vec::new();
        for i in 0..2500 {
            if i == 10 || i == 1500 || i == 2400 {
                planted.push(publish_match(&store, &ledger));
            } else {
                publish_non_match(&ledger);
            }
        }

        // First pass: page 1 succeeds, page 2 fails
        let failing = Arc::new(FailingLedger::new(ledger.clone(), 2));
        let engine = SyncEngine::new(store.clone(), failing);
        let result = engine.sync(IDENTITY).await;
        assert!(matches!(result, Err(VeilError::LedgerIo(_))));

        // Cursor checkpointed at the end of page 1
        let cursor = store.cursor(IDENTITY).unwrap();
        assert_eq!(cursor.last_event_id, Some(EventId::new("ev-1000")));
        assert!(cursor.last_synced_at.is_none()); // pass never completed

        // Retry resumes from the checkpoint and finishes the scan
        let engine = SyncEngine::new(store.clone(), ledger);
        let report = engine.sync(IDENTITY).await.unwrap().report().unwrap();
        assert_eq!(report.events_scanned, 1500);
        assert_eq!(report.pages, 2);

        // All planted payments recovered exactly once each
        let accounts = store.recovered_accounts(IDENTITY).unwrap();
        assert_eq!(accounts.len(), 3);
        let mut recovered: Vec<LedgerAddress> = accounts.iter().map(|a| a.address).collect();
        let mut expected = planted.clone();
        recovered.sort();
        expected.sort();
        assert_eq!(recovered, expected);

        let cursor = store.cursor(IDENTITY).unwrap();
        assert_eq!(cursor.last_event_id, Some(EventId::new("ev-2500")));
        assert!(cursor.last_synced_at.is_some());

        // A further pass finds nothing new
        let report = engine.sync(IDENTITY).await.unwrap().report().unwrap();
        assert_eq!(report.new_accounts, 0);
        assert_eq!(store.recovered_count(IDENTITY).unwrap(), 3);
    }

    #[tokio::test]
    async fn test_malformed_ephemeral_key_is_skipped() {
        let (store, ledger) = setup();

        // Structurally valid SEC1 tag, but not a point on the curve
        let mut bytes = [0xFFu8; 33];
        bytes[0] = 0x02;
        ledger
            .publish(
                CompressedPublicKey::from_array(bytes),
                LedgerAddress::from_array([0x77; 32]),
            )
            .unwrap();
        publish_match(&store, &ledger);

        let engine = SyncEngine::new(store.clone(), ledger);
        let report = engine.sync(IDENTITY).await.unwrap().report().unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.new_accounts, 1);
    }

    #[tokio::test]
    async fn test_reset_cursor_rescans_from_genesis() {
        let (store, ledger) = setup();
        publish_match(&store, &ledger);

        let engine = SyncEngine::new(store.clone(), ledger);
        engine.sync(IDENTITY).await.unwrap();
        assert_eq!(store.recovered_count(IDENTITY).unwrap(), 1);

        store.reset_cursor(IDENTITY).unwrap();
        let report = engine.sync(IDENTITY).await.unwrap().report().unwrap();

        // Re-scan sees the event again but the recovered set is unchanged
        assert_eq!(report.events_scanned, 1);
        assert_eq!(report.new_accounts, 0);
        assert_eq!(store.recovered_count(IDENTITY).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_interval_trigger_discovers_new_payments() {
        let (store, ledger) = setup();
        let engine = Arc::new(SyncEngine::new(store.clone(), ledger.clone()));

        let handle = engine.spawn_interval(IDENTITY.to_owned(), Duration::from_millis(25));

        publish_match(&store, &ledger);
        tokio::time::sleep(Duration::from_millis(120)).await;
        handle.abort();

        assert_eq!(store.recovered_count(IDENTITY).unwrap(), 1);
    }
}
