//! Address types for Veil.
//!
//! - [`LedgerAddress`]: A 32-byte ledger account address
//! - [`ReceivingAddress`]: The shareable text encoding of (nonce, owner pub)

use serde::{Deserialize, Serialize};

use crate::constants::{
    LEDGER_ADDRESS_SIZE, RECEIVING_ADDRESS_PREFIX, RECEIVING_ADDRESS_RAW_SIZE, SCALAR_SIZE,
};
use crate::error::{Result, VeilError};
use crate::types::keys::{CompressedPublicKey, ReceivingNonce};

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A 32-byte ledger account address.
///
/// Derived as blake2b-256(scheme_flag || compressed_pubkey) and rendered as
/// 0x-prefixed hex, matching the ledger's native account model.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LedgerAddress {
    bytes: [u8; LEDGER_ADDRESS_SIZE],
}

impl LedgerAddress {
    /// Creates an address from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != LEDGER_ADDRESS_SIZE {
            return Err(VeilError::InvalidLength {
                expected: LEDGER_ADDRESS_SIZE,
                actual: bytes.len(),
            });
        }

        let mut arr = [0u8; LEDGER_ADDRESS_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Creates from a fixed-size array.
    pub fn from_array(bytes: [u8; LEDGER_ADDRESS_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns hex string with 0x prefix (ledger format).
    pub fn to_hex_string(&self) -> String {
        format!("0x{}", hex::encode(self.bytes))
    }

    /// Parses from hex string (with or without 0x prefix).
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        Self::from_bytes(&bytes)
    }

    /// Returns the zero address.
    pub fn zero() -> Self {
        Self {
            bytes: [0u8; LEDGER_ADDRESS_SIZE],
        }
    }

    /// Returns true if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }
}

impl std::fmt::Debug for LedgerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerAddress({})", self.to_hex_string())
    }
}

impl std::fmt::Display for LedgerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex_string())
    }
}

impl Serialize for LedgerAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for LedgerAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECEIVING ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// The human-shareable receiving address.
///
/// Text form: fixed prefix + base58(receiving_nonce (32) || owner_pub (33)).
/// The nonce always comes first; the decode path depends on that order.
///
/// # Example
/// ```
/// use veil_core::{CompressedPublicKey, ReceivingAddress, ReceivingNonce};
///
/// let nonce = ReceivingNonce::from_array([7u8; 32]);
/// let mut pk = [0x22u8; 33];
/// pk[0] = 0x02;
/// let owner_pub = CompressedPublicKey::from_bytes(&pk).unwrap();
///
/// let addr = ReceivingAddress::new(nonce, owner_pub);
/// let text = addr.encode();
/// assert!(text.starts_with("veil"));
/// assert_eq!(ReceivingAddress::decode(&text).unwrap(), addr);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceivingAddress {
    /// The rotatable nonce (first 32 payload bytes)
    pub nonce: ReceivingNonce,
    /// The owner's meta public key (last 33 payload bytes)
    pub owner_pub: CompressedPublicKey,
}

impl ReceivingAddress {
    /// Creates a receiving address from its parts.
    pub fn new(nonce: ReceivingNonce, owner_pub: CompressedPublicKey) -> Self {
        Self { nonce, owner_pub }
    }

    /// Encodes to the shareable text form.
    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(RECEIVING_ADDRESS_RAW_SIZE);
        payload.extend_from_slice(self.nonce.as_bytes());
        payload.extend_from_slice(self.owner_pub.as_bytes());
        format!(
            "{}{}",
            RECEIVING_ADDRESS_PREFIX,
            bs58::encode(payload).into_string()
        )
    }

    /// Decodes from the shareable text form.
    ///
    /// # Errors
    /// - [`VeilError::InvalidReceivingAddress`] on a missing prefix
    /// - [`VeilError::Base58Error`] on a bad base58 payload
    /// - [`VeilError::InvalidLength`] on a wrong-length payload
    /// - [`VeilError::InvalidPoint`] on a malformed public-key encoding
    pub fn decode(s: &str) -> Result<Self> {
        let payload = s.strip_prefix(RECEIVING_ADDRESS_PREFIX).ok_or_else(|| {
            VeilError::InvalidReceivingAddress(format!(
                "missing '{RECEIVING_ADDRESS_PREFIX}' prefix"
            ))
        })?;

        let bytes = bs58::decode(payload).into_vec()?;
        if bytes.len() != RECEIVING_ADDRESS_RAW_SIZE {
            return Err(VeilError::InvalidLength {
                expected: RECEIVING_ADDRESS_RAW_SIZE,
                actual: bytes.len(),
            });
        }

        let nonce = ReceivingNonce::from_bytes(&bytes[..SCALAR_SIZE])?;
        let owner_pub = CompressedPublicKey::from_bytes(&bytes[SCALAR_SIZE..])?;
        Ok(Self { nonce, owner_pub })
    }
}

impl std::fmt::Display for ReceivingAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl Serialize for ReceivingAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for ReceivingAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_pub() -> CompressedPublicKey {
        let mut bytes = [0x5Au8; 33];
        bytes[0] = 0x03;
        CompressedPublicKey::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_ledger_address_formatting() {
        let addr = LedgerAddress::from_array([0xAB; 32]);
        let s = addr.to_hex_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 66); // "0x" + 64 hex chars
    }

    #[test]
    fn test_ledger_address_hex_roundtrip() {
        let addr = LedgerAddress::from_array([0x12; 32]);
        let hex = addr.to_hex_string();
        let addr2 = LedgerAddress::from_hex(&hex).unwrap();
        assert_eq!(addr, addr2);
    }

    #[test]
    fn test_ledger_address_zero() {
        let zero = LedgerAddress::zero();
        assert!(zero.is_zero());

        let non_zero = LedgerAddress::from_array([1; 32]);
        assert!(!non_zero.is_zero());
    }

    #[test]
    fn test_ledger_address_serde() {
        let addr = LedgerAddress::from_array([0x33; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        let addr2: LedgerAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, addr2);
    }

    #[test]
    fn test_receiving_address_roundtrip() {
        let addr = ReceivingAddress::new(ReceivingNonce::from_array([0x01; 32]), test_pub());
        let text = addr.encode();
        assert!(text.starts_with(RECEIVING_ADDRESS_PREFIX));

        let decoded = ReceivingAddress::decode(&text).unwrap();
        assert_eq!(decoded, addr);
    }

    #[test]
    fn test_receiving_address_rejects_missing_prefix() {
        let addr = ReceivingAddress::new(ReceivingNonce::from_array([0x01; 32]), test_pub());
        let text = addr.encode();
        let stripped = text.strip_prefix(RECEIVING_ADDRESS_PREFIX).unwrap();

        let result = ReceivingAddress::decode(stripped);
        assert!(matches!(result, Err(VeilError::InvalidReceivingAddress(_))));
    }

    #[test]
    fn test_receiving_address_rejects_bad_base58() {
        // '0' is not a base58 character
        let result = ReceivingAddress::decode("veil0000");
        assert!(matches!(result, Err(VeilError::Base58Error(_))));
    }

    #[test]
    fn test_receiving_address_rejects_short_payload() {
        let short = format!(
            "{}{}",
            RECEIVING_ADDRESS_PREFIX,
            bs58::encode([1u8; 10]).into_string()
        );
        let result = ReceivingAddress::decode(&short);
        assert!(matches!(result, Err(VeilError::InvalidLength { .. })));
    }

    #[test]
    fn test_receiving_address_rejects_bad_point_tag() {
        // Correct length but an invalid SEC1 tag in the public-key half
        let mut payload = [0u8; RECEIVING_ADDRESS_RAW_SIZE];
        payload[SCALAR_SIZE] = 0x07;
        let text = format!(
            "{}{}",
            RECEIVING_ADDRESS_PREFIX,
            bs58::encode(payload).into_string()
        );
        let result = ReceivingAddress::decode(&text);
        assert!(matches!(result, Err(VeilError::InvalidPoint(_))));
    }

    #[test]
    fn test_nonce_comes_first_in_payload() {
        let nonce = ReceivingNonce::from_array([0xAA; 32]);
        let addr = ReceivingAddress::new(nonce, test_pub());
        let text = addr.encode();

        let payload = bs58::decode(text.strip_prefix(RECEIVING_ADDRESS_PREFIX).unwrap())
            .into_vec()
            .unwrap();
        assert_eq!(&payload[..SCALAR_SIZE], nonce.as_bytes());
        assert_eq!(&payload[SCALAR_SIZE..], addr.owner_pub.as_bytes());
    }

    proptest! {
        #[test]
        fn prop_receiving_address_roundtrip(nonce in any::<[u8; 32]>(), x in any::<[u8; 32]>(), odd in any::<bool>()) {
            let mut pk = [0u8; 33];
            pk[0] = if odd { 0x03 } else { 0x02 };
            pk[1..].copy_from_slice(&x);

            let addr = ReceivingAddress::new(
                ReceivingNonce::from_array(nonce),
                CompressedPublicKey::from_bytes(&pk).unwrap(),
            );
            let decoded = ReceivingAddress::decode(&addr.encode()).unwrap();
            prop_assert_eq!(decoded, addr);
        }
    }
}
