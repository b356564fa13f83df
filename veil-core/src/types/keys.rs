//! Key types for Veil.
//!
//! This module defines the key structures used in the protocol:
//!
//! - [`CompressedPublicKey`]: SEC1 compressed secp256k1 point (33 bytes)
//! - [`MetaPrivateKey`]: Long-lived owner scalar (32 bytes, zeroized on drop)
//! - [`ReceivingNonce`]: Rotatable scalar embedded in the receiving address
//! - [`MetaKeyPair`]: The complete receiving identity
//! - [`OneTimePrivateKey`]: Recovered per-payment spending scalar
//! - [`RecoveredAccount`]: A stealth account whose spending key was reconstructed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{
    COMPRESSED_POINT_SIZE, SCALAR_SIZE, SEC1_TAG_COMPRESSED_EVEN, SEC1_TAG_COMPRESSED_ODD,
};
use crate::error::{Result, VeilError};
use crate::types::address::LedgerAddress;
use crate::types::event::EventId;

// ═══════════════════════════════════════════════════════════════════════════════
// COMPRESSED PUBLIC KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// A SEC1-compressed secp256k1 public key.
///
/// Used for the meta public key, ephemeral public keys, and stealth public
/// keys alike; all three are points on the same curve. Safe to share publicly.
///
/// Construction validates length and the SEC1 tag byte only; full on-curve
/// validation happens when the point is decoded for arithmetic.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressedPublicKey {
    bytes: [u8; COMPRESSED_POINT_SIZE],
}

impl CompressedPublicKey {
    /// Creates a public key from raw bytes.
    ///
    /// # Errors
    /// Returns an error if the length is not 33 bytes or the SEC1 tag byte
    /// is not 0x02/0x03.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != COMPRESSED_POINT_SIZE {
            return Err(VeilError::InvalidLength {
                expected: COMPRESSED_POINT_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes[0] != SEC1_TAG_COMPRESSED_EVEN && bytes[0] != SEC1_TAG_COMPRESSED_ODD {
            return Err(VeilError::InvalidPoint(format!(
                "bad SEC1 tag byte 0x{:02x}",
                bytes[0]
            )));
        }

        let mut arr = [0u8; COMPRESSED_POINT_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates a public key from a fixed-size array without tag validation.
    ///
    /// Intended for values produced by the crypto layer, which only emits
    /// well-formed encodings.
    pub fn from_array(bytes: [u8; COMPRESSED_POINT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes of the public key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the public key as a fixed-size array reference.
    pub fn as_array(&self) -> &[u8; COMPRESSED_POINT_SIZE] {
        &self.bytes
    }

    /// Returns the hex-encoded public key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Creates a public key from a hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for CompressedPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Only show first/last 4 bytes for readability
        write!(
            f,
            "CompressedPublicKey({}...{})",
            hex::encode(&self.bytes[..4]),
            hex::encode(&self.bytes[COMPRESSED_POINT_SIZE - 4..])
        )
    }
}

// Serde implementation that uses hex encoding
impl Serialize for CompressedPublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CompressedPublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// META PRIVATE KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// The long-lived owner scalar of a receiving identity.
///
/// This key is sensitive and will be automatically zeroized when dropped.
/// It is deliberately not serializable; persistence goes through the sealed
/// snapshot vault. Never expose this key in logs or error messages.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MetaPrivateKey {
    bytes: [u8; SCALAR_SIZE],
}

impl MetaPrivateKey {
    /// Creates a private key from raw bytes.
    ///
    /// # Errors
    /// Returns an error if the length is not 32 bytes or the bytes are all
    /// zero (the degenerate scalar).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SCALAR_SIZE {
            return Err(VeilError::InvalidLength {
                expected: SCALAR_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes.iter().all(|&b| b == 0) {
            return Err(VeilError::InvalidScalar("zero scalar".into()));
        }

        let mut arr = [0u8; SCALAR_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates a private key from a fixed-size array.
    pub fn from_array(bytes: [u8; SCALAR_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes of the private key.
    ///
    /// # Security
    /// Handle the returned bytes carefully - do not log or expose them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the private key as a fixed-size array reference.
    pub fn as_array(&self) -> &[u8; SCALAR_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for MetaPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose secret key content
        write!(f, "MetaPrivateKey([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECEIVING NONCE
// ═══════════════════════════════════════════════════════════════════════════════

/// The rotatable scalar embedded in the shareable receiving address.
///
/// The nonce travels in plaintext inside the address string, so it is not a
/// secret; it exists to give the direct-address payment flow an ephemeral
/// scalar and is regenerated whenever the holder rotates their address.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ReceivingNonce {
    bytes: [u8; SCALAR_SIZE],
}

impl ReceivingNonce {
    /// Creates a nonce from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SCALAR_SIZE {
            return Err(VeilError::InvalidLength {
                expected: SCALAR_SIZE,
                actual: bytes.len(),
            });
        }

        let mut arr = [0u8; SCALAR_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates a nonce from a fixed-size array.
    pub fn from_array(bytes: [u8; SCALAR_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes of the nonce.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the nonce as a fixed-size array reference.
    pub fn as_array(&self) -> &[u8; SCALAR_SIZE] {
        &self.bytes
    }

    /// Returns the hex-encoded nonce.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Creates a nonce from a hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }
}

impl std::fmt::Debug for ReceivingNonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ReceivingNonce({}...{})",
            hex::encode(&self.bytes[..4]),
            hex::encode(&self.bytes[SCALAR_SIZE - 4..])
        )
    }
}

impl Serialize for ReceivingNonce {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ReceivingNonce {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// META KEY PAIR
// ═══════════════════════════════════════════════════════════════════════════════

/// The complete receiving identity: owner keys plus the current nonce.
///
/// Invariant: `public = private · G` at all times. The nonce may be rotated
/// freely without invalidating the owner keys.
#[derive(Clone)]
pub struct MetaKeyPair {
    /// Owner private scalar (keep private, auto-zeroized)
    pub private: MetaPrivateKey,
    /// Owner public key (safe to share)
    pub public: CompressedPublicKey,
    /// Current receiving nonce (embedded in the address string)
    pub receiving_nonce: ReceivingNonce,
}

impl MetaKeyPair {
    /// Creates a new meta key pair.
    pub fn new(
        private: MetaPrivateKey,
        public: CompressedPublicKey,
        receiving_nonce: ReceivingNonce,
    ) -> Self {
        Self {
            private,
            public,
            receiving_nonce,
        }
    }

    /// Returns the current shareable receiving address.
    pub fn receiving_address(&self) -> crate::types::address::ReceivingAddress {
        crate::types::address::ReceivingAddress::new(self.receiving_nonce, self.public)
    }
}

impl std::fmt::Debug for MetaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaKeyPair")
            .field("public", &self.public)
            .field("receiving_nonce", &self.receiving_nonce)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ONE-TIME PRIVATE KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// A recovered per-payment spending scalar.
///
/// Derived as `(ownerPriv + h) mod n`; zeroized on drop. Like
/// [`MetaPrivateKey`] it is not serializable outside the sealed vault.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct OneTimePrivateKey {
    bytes: [u8; SCALAR_SIZE],
}

impl OneTimePrivateKey {
    /// Creates a one-time private key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SCALAR_SIZE {
            return Err(VeilError::InvalidLength {
                expected: SCALAR_SIZE,
                actual: bytes.len(),
            });
        }
        if bytes.iter().all(|&b| b == 0) {
            return Err(VeilError::InvalidScalar("zero scalar".into()));
        }

        let mut arr = [0u8; SCALAR_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates a one-time private key from a fixed-size array.
    pub fn from_array(bytes: [u8; SCALAR_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes of the key.
    ///
    /// # Security
    /// Handle the returned bytes carefully - do not log or expose them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the key as a fixed-size array reference.
    pub fn as_array(&self) -> &[u8; SCALAR_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for OneTimePrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OneTimePrivateKey([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECOVERED ACCOUNT
// ═══════════════════════════════════════════════════════════════════════════════

/// A stealth account discovered during a ledger scan.
///
/// Created only when the address derived from the recovered private key
/// equals the address carried by the ledger event; immutable once created.
#[derive(Clone)]
pub struct RecoveredAccount {
    /// The one-time stealth address on the ledger
    pub address: LedgerAddress,
    /// The reconstructed spending key for this address
    pub private_key: OneTimePrivateKey,
    /// The ledger event that produced this account
    pub event_id: EventId,
    /// When the scan recovered this account
    pub recovered_at: DateTime<Utc>,
}

impl RecoveredAccount {
    /// Creates a new recovered account stamped with the current time.
    pub fn new(address: LedgerAddress, private_key: OneTimePrivateKey, event_id: EventId) -> Self {
        Self {
            address,
            private_key,
            event_id,
            recovered_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for RecoveredAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveredAccount")
            .field("address", &self.address)
            .field("event_id", &self.event_id)
            .field("recovered_at", &self.recovered_at)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}
