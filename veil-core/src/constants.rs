//! Protocol constants for Veil.
//!
//! All cryptographic sizes follow SEC1 encodings over secp256k1 and the
//! ledger's 32-byte account address model.

// ═══════════════════════════════════════════════════════════════════════════════
// SECP256K1 SIZES (SEC1)
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of a secp256k1 scalar (private key, receiving nonce) in bytes.
pub const SCALAR_SIZE: usize = 32;

/// Size of a SEC1 compressed curve point in bytes (tag byte + x-coordinate).
pub const COMPRESSED_POINT_SIZE: usize = 33;

/// SEC1 tag byte for a compressed point with even y.
pub const SEC1_TAG_COMPRESSED_EVEN: u8 = 0x02;

/// SEC1 tag byte for a compressed point with odd y.
pub const SEC1_TAG_COMPRESSED_ODD: u8 = 0x03;

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER ADDRESS CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Size of a ledger account address in bytes (blake2b-256 output).
pub const LEDGER_ADDRESS_SIZE: usize = 32;

/// Signature-scheme flag prepended to the compressed public key before
/// hashing into a ledger address. 0x01 identifies secp256k1 accounts.
pub const ADDRESS_SCHEME_SECP256K1: u8 = 0x01;

/// Size of keccak256 hash output.
pub const KECCAK256_SIZE: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// RECEIVING ADDRESS ENCODING
// ═══════════════════════════════════════════════════════════════════════════════

/// Human-readable prefix of the shareable receiving-address string.
pub const RECEIVING_ADDRESS_PREFIX: &str = "veil";

/// Raw payload size of a receiving address before base58 encoding:
/// receiving nonce (32) || compressed owner public key (33).
pub const RECEIVING_ADDRESS_RAW_SIZE: usize = SCALAR_SIZE + COMPRESSED_POINT_SIZE;

// ═══════════════════════════════════════════════════════════════════════════════
// DOMAIN SEPARATORS
// ═══════════════════════════════════════════════════════════════════════════════
// Each SHAKE256 invocation uses a unique domain separator to ensure
// outputs from different operations never collide, even with same inputs.

/// Domain separator for the snapshot vault key derivation.
pub const DOMAIN_VAULT_KEY: &[u8] = b"VEIL_VAULT_KEY_V1";

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER EVENT CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Ledger event type identifier the sync engine filters on.
pub const STEALTH_EVENT_TYPE: &str = "core::NewEphemeralPub";

/// Default page size for ledger event scans.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Maximum events to request in a single ledger page.
pub const MAX_PAGE_SIZE: usize = 10_000;

/// Default timeout in seconds for a single ledger page fetch.
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 30;

/// Default interval in seconds between externally triggered sync passes.
pub const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;

// ═══════════════════════════════════════════════════════════════════════════════
// PROTOCOL VERSIONING
// ═══════════════════════════════════════════════════════════════════════════════

/// Current protocol version.
/// Increment when making breaking changes to serialization formats.
pub const PROTOCOL_VERSION: u8 = 1;

/// Minimum supported protocol version for backward compatibility.
pub const MIN_PROTOCOL_VERSION: u8 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sec1_sizes() {
        // Compressed SEC1 point: 1 tag byte + 32-byte x-coordinate
        assert_eq!(COMPRESSED_POINT_SIZE, 1 + SCALAR_SIZE);
    }

    #[test]
    fn test_receiving_address_raw_size() {
        // nonce (32) || compressed owner pub (33)
        assert_eq!(RECEIVING_ADDRESS_RAW_SIZE, 65);
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(DEFAULT_PAGE_SIZE <= MAX_PAGE_SIZE);
    }

    #[test]
    fn test_prefix_is_not_base58_ambiguous() {
        // The prefix must be distinguishable from the base58 payload; base58
        // strings never contain '0', 'O', 'I', or 'l', and the decoder strips
        // the prefix by exact match, so any fixed ASCII prefix works.
        assert!(!RECEIVING_ADDRESS_PREFIX.is_empty());
        assert!(RECEIVING_ADDRESS_PREFIX.is_ascii());
    }
}
