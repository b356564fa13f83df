//! Error types for Veil.
//!
//! This module provides a comprehensive error hierarchy using `thiserror`.
//! All errors include context and are designed to be actionable.

use thiserror::Error;

/// Result type alias using `VeilError`.
pub type Result<T> = std::result::Result<T, VeilError>;

/// Main error type for all Veil operations.
#[derive(Debug, Error)]
pub enum VeilError {
    // ═══════════════════════════════════════════════════════════════════════════
    // DECODE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Receiving-address text is malformed (bad prefix or structure).
    #[error("Invalid receiving address: {0}")]
    InvalidReceivingAddress(String),

    /// Base58 payload could not be decoded.
    #[error("Invalid base58: {0}")]
    Base58Error(#[from] bs58::decode::Error),

    /// Decoded payload has the wrong length.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    HexError(#[from] hex::FromHexError),

    // ═══════════════════════════════════════════════════════════════════════════
    // CRYPTOGRAPHIC ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Bytes do not decode to a valid point in the curve's subgroup.
    #[error("Invalid curve point: {0}")]
    InvalidPoint(String),

    /// Bytes do not represent a usable scalar (zero or out of range).
    #[error("Invalid scalar: {0}")]
    InvalidScalar(String),

    /// Key generation failed.
    #[error("Key generation failed: {0}")]
    KeyGenerationError(String),

    /// A stealth derivation step could not validate its inputs.
    #[error("Stealth derivation failed: {0}")]
    DerivationError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCOUNT STORE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Operation requested for an identity with no generated meta key.
    #[error("No meta key for identity: {0}")]
    NoMetaKey(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // LEDGER ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Ledger page fetch failed.
    #[error("Ledger read failed: {0}")]
    LedgerIo(String),

    /// Ledger page fetch exceeded the configured timeout.
    #[error("Ledger read timed out after {seconds}s")]
    LedgerTimeout { seconds: u64 },

    /// The ledger does not recognize the supplied cursor token.
    #[error("Unknown ledger cursor: {0}")]
    UnknownCursor(String),

    /// A ledger event failed boundary validation.
    #[error("Invalid ledger event: {0}")]
    InvalidEvent(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // NAME REGISTRY ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Name lookup found no registered public key.
    #[error("Name not found: {0}")]
    NameNotFound(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // BALANCE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Balance source query failed.
    #[error("Balance query failed: {0}")]
    BalanceSource(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // VAULT / STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Sealing a snapshot failed.
    #[error("Vault seal failed: {0}")]
    VaultSealFailed(String),

    /// Opening a sealed snapshot failed (wrong password or tampered payload).
    #[error("Vault open failed: {0}")]
    VaultOpenFailed(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Protocol version mismatch.
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    // ═══════════════════════════════════════════════════════════════════════════
    // INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl VeilError {
    /// Returns true if this error is recoverable (the caller can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VeilError::LedgerIo(_) | VeilError::LedgerTimeout { .. } | VeilError::BalanceSource(_)
        )
    }

    /// Returns true if this is a decode error ("invalid recipient" class).
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            VeilError::InvalidReceivingAddress(_)
                | VeilError::Base58Error(_)
                | VeilError::InvalidLength { .. }
                | VeilError::HexError(_)
        )
    }

    /// Returns true if this is a cryptographic error.
    pub fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            VeilError::InvalidPoint(_)
                | VeilError::InvalidScalar(_)
                | VeilError::KeyGenerationError(_)
                | VeilError::DerivationError(_)
        )
    }
}
