//! # Veil Stealth
//!
//! High-level stealth payment operations: the meta account store (the
//! authoritative home of private keys), sender-side payment construction for
//! both call modes, and sealed snapshots for persistence.
//!
//! ## Example
//!
//! ```rust
//! use veil_stealth::{MetaAccountStore, pay_to_receiving_address};
//!
//! let store = MetaAccountStore::new();
//! let address = store.generate(b"wallet-signature", "wallet-a").unwrap();
//!
//! // A payer derives a one-time destination from the shared address string
//! let payment = pay_to_receiving_address(&address.encode()).unwrap();
//! assert!(!payment.address.is_zero());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod payment;
pub mod store;
pub mod vault;

pub use payment::{
    pay_to_name, pay_to_public_key, pay_to_receiving_address, pay_with_ephemeral, StealthPayment,
};
pub use store::MetaAccountStore;
pub use vault::{IdentitySnapshot, SealedSecrets};
