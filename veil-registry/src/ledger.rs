//! In-memory ledger event log.
//!
//! Insertion-ordered storage with cursor-based pagination, matching the
//! read semantics of the real ledger's event query: ascending order,
//! "fetch page after cursor", and an explicit has-next signal. A
//! production adapter issues the same query against the node's RPC,
//! filtered by [`veil_core::constants::STEALTH_EVENT_TYPE`]; this log
//! holds only events of that type by construction.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use async_trait::async_trait;

use veil_core::constants::MAX_PAGE_SIZE;
use veil_core::error::{Result, VeilError};
use veil_core::traits::LedgerSource;
use veil_core::types::{CompressedPublicKey, EventId, EventPage, LedgerAddress, StealthEvent};

/// In-memory stealth event log.
///
/// Thread-safe; events are immutable once published and ids are assigned
/// sequentially in insertion order.
#[derive(Debug)]
pub struct MemoryLedger {
    /// Events in insertion (ledger) order
    events: RwLock<Vec<StealthEvent>>,
    /// Event id → position index, for cursor resolution
    positions: DashMap<String, usize>,
    /// Next event sequence number
    next_seq: AtomicU64,
}

impl MemoryLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            positions: DashMap::new(),
            next_seq: AtomicU64::new(1),
        }
    }

    /// Publishes a stealth event and returns its assigned id.
    #[instrument(skip(self, ephemeral_pub, resulting_address))]
    pub fn publish(
        &self,
        ephemeral_pub: CompressedPublicKey,
        resulting_address: LedgerAddress,
    ) -> Result<EventId> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let id = EventId::new(format!("ev-{seq}"));
        let event = StealthEvent::new(id.clone(), ephemeral_pub, resulting_address);
        event.validate()?;

        let mut events = self.events.write();
        self.positions.insert(id.as_str().to_owned(), events.len());
        events.push(event);

        debug!(id = %id, total = events.len(), "Published stealth event");
        Ok(id)
    }

    /// Returns the number of events in the ledger.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if the ledger holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Removes all events (testing convenience).
    pub fn clear(&self) {
        self.events.write().clear();
        self.positions.clear();
        self.next_seq.store(1, Ordering::SeqCst);
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerSource for MemoryLedger {
    async fn events_after(&self, cursor: Option<&EventId>, limit: usize) -> Result<EventPage> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let events = self.events.read();

        let start = match cursor {
            None => 0,
            Some(id) => {
                let pos = self
                    .positions
                    .get(id.as_str())
                    .ok_or_else(|| VeilError::UnknownCursor(id.to_string()))?;
                *pos + 1
            }
        };

        let end = (start + limit).min(events.len());
        let page: Vec<StealthEvent> = events.get(start..end).unwrap_or(&[]).to_vec();
        let next_cursor = page.last().map(|e| e.id.clone());
        let has_next = end < events.len();

        debug!(
            start,
            count = page.len(),
            has_next,
            "Served ledger event page"
        );
        Ok(EventPage::new(page, next_cursor, has_next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_crypto::{public_from_scalar, random_scalar};

    fn test_event_parts() -> (CompressedPublicKey, LedgerAddress) {
        let pk = public_from_scalar(&random_scalar()).unwrap();
        (pk, LedgerAddress::from_array([0x11; 32]))
    }

    #[tokio::test]
    async fn test_publish_and_read_back() {
        let ledger = MemoryLedger::new();
        let (pk, addr) = test_event_parts();

        let id = ledger.publish(pk, addr).unwrap();
        assert_eq!(id.as_str(), "ev-1");

        let page = ledger.events_after(None, 10).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.events[0].resulting_address, addr);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_pagination_in_ascending_order() {
        let ledger = MemoryLedger::new();
        for _ in 0..25 {
            let (pk, addr) = test_event_parts();
            ledger.publish(pk, addr).unwrap();
        }

        let mut cursor: Option<EventId> = None;
        let mut seen = Vec::new();
        loop {
            let page = ledger.events_after(cursor.as_ref(), 10).await.unwrap();
            seen.extend(page.events.iter().map(|e| e.id.as_str().to_owned()));
            if !page.has_next {
                break;
            }
            cursor = page.next_cursor;
        }

        assert_eq!(seen.len(), 25);
        // Strictly ascending sequence, each event exactly once
        let expected: Vec<String> = (1..=25).map(|i| format!("ev-{i}")).collect();
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_cursor_at_tip_yields_empty_terminal_page() {
        let ledger = MemoryLedger::new();
        let (pk, addr) = test_event_parts();
        let id = ledger.publish(pk, addr).unwrap();

        let page = ledger.events_after(Some(&id), 10).await.unwrap();
        assert!(page.is_empty());
        assert!(!page.has_next);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn test_unknown_cursor_is_an_error() {
        let ledger = MemoryLedger::new();
        let bogus = EventId::new("ev-999");
        let result = ledger.events_after(Some(&bogus), 10).await;
        assert!(matches!(result, Err(VeilError::UnknownCursor(_))));
    }

    #[tokio::test]
    async fn test_zero_address_event_rejected() {
        let ledger = MemoryLedger::new();
        let (pk, _) = test_event_parts();
        let result = ledger.publish(pk, LedgerAddress::zero());
        assert!(matches!(result, Err(VeilError::InvalidEvent(_))));
    }

    #[tokio::test]
    async fn test_concurrent_publish() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let ledger = Arc::new(MemoryLedger::new());
        let mut tasks = JoinSet::new();

        for _ in 0..100 {
            let ledger = ledger.clone();
            tasks.spawn(async move {
                let (pk, addr) = test_event_parts();
                ledger.publish(pk, addr).unwrap()
            });
        }

        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(ledger.len(), 100);
    }
}
