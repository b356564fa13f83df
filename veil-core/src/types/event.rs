//! Ledger event types and the resumable sync cursor.
//!
//! Payers emit a stealth event per payment; the sync engine consumes the
//! event stream in ascending ledger order and tracks its position with a
//! [`SyncCursor`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VeilError};
use crate::types::address::LedgerAddress;
use crate::types::keys::CompressedPublicKey;

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT ID
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque ledger position token.
///
/// The engine never interprets the token; it only hands it back to the
/// ledger source as a "fetch after this" cursor.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Creates an event id from any string-like token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEALTH EVENT
// ═══════════════════════════════════════════════════════════════════════════════

/// A stealth payment event read from the ledger.
///
/// Strongly typed at the boundary: the ephemeral key is structurally
/// validated on construction, and anything the ledger serves that fails
/// validation is skipped by the scan rather than propagated inward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthEvent {
    /// Ledger-assigned position token for this event
    pub id: EventId,
    /// The payer's ephemeral public key
    pub ephemeral_pub: CompressedPublicKey,
    /// The one-time address the payment was sent to
    pub resulting_address: LedgerAddress,
}

impl StealthEvent {
    /// Creates a new stealth event.
    pub fn new(
        id: EventId,
        ephemeral_pub: CompressedPublicKey,
        resulting_address: LedgerAddress,
    ) -> Self {
        Self {
            id,
            ephemeral_pub,
            resulting_address,
        }
    }

    /// Validates the event structure.
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().is_empty() {
            return Err(VeilError::InvalidEvent("empty event id".into()));
        }
        if self.resulting_address.is_zero() {
            return Err(VeilError::InvalidEvent(
                "resulting address is the zero address".into(),
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENT PAGE
// ═══════════════════════════════════════════════════════════════════════════════

/// One page of a paginated ledger event query.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventPage {
    /// Events in ascending ledger order
    pub events: Vec<StealthEvent>,
    /// The ledger's token for the next page, if it supplied one
    pub next_cursor: Option<EventId>,
    /// Whether more pages follow this one
    pub has_next: bool,
}

impl EventPage {
    /// Creates a page.
    pub fn new(events: Vec<StealthEvent>, next_cursor: Option<EventId>, has_next: bool) -> Self {
        Self {
            events,
            next_cursor,
            has_next,
        }
    }

    /// Returns an empty terminal page.
    pub fn empty() -> Self {
        Self {
            events: Vec::new(),
            next_cursor: None,
            has_next: false,
        }
    }

    /// Returns the number of events in this page.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true if this page carries no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNC CURSOR
// ═══════════════════════════════════════════════════════════════════════════════

/// The resumable position marker into the ledger's event stream.
///
/// Invariant: advances monotonically; it is never rewound except by an
/// explicit reset. `last_synced_at` is informational only and plays no part
/// in resumption.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    /// Last processed ledger position, `None` meaning "scan from genesis"
    pub last_event_id: Option<EventId>,
    /// When the last completed pass finished
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncCursor {
    /// Returns the genesis cursor (scan everything).
    pub fn genesis() -> Self {
        Self::default()
    }

    /// Returns true if no position has been recorded yet.
    pub fn is_genesis(&self) -> bool {
        self.last_event_id.is_none()
    }
}
