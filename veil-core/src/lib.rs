//! # Veil Core
//!
//! Core types, errors, and traits for the Veil stealth payment protocol.
//!
//! This crate provides the foundational building blocks used by all other Veil crates:
//!
//! - **Types**: Domain models for keys, addresses, ledger events, and sync cursors
//! - **Errors**: Comprehensive error types with context
//! - **Constants**: Protocol constants and sizes
//! - **Traits**: Interfaces for the external ledger, name registry, and balance source
//!
//! ## Example
//!
//! ```rust
//! use veil_core::{LedgerAddress, SyncCursor, VeilError};
//!
//! // Types are serializable and well-documented
//! let cursor = SyncCursor::genesis();
//! let json = serde_json::to_string(&cursor).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{Result, VeilError};
pub use traits::*;
pub use types::*;
