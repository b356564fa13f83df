//! Domain types for the Veil protocol.
//!
//! Organized by concern:
//!
//! - [`keys`]: Meta key pairs, receiving nonces, recovered one-time accounts
//! - [`address`]: Ledger addresses and the shareable receiving-address encoding
//! - [`event`]: Ledger stealth events, pages, and the resumable sync cursor

pub mod address;
pub mod event;
pub mod keys;

pub use address::{LedgerAddress, ReceivingAddress};
pub use event::{EventId, EventPage, StealthEvent, SyncCursor};
pub use keys::{
    CompressedPublicKey, MetaKeyPair, MetaPrivateKey, OneTimePrivateKey, ReceivingNonce,
    RecoveredAccount,
};
