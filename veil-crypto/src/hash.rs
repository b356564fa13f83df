//! Hashing utilities.
//!
//! keccak256 maps the compressed ECDH point to the stealth tweak scalar;
//! SHAKE256 with domain separation backs the snapshot vault's key
//! derivation.

use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

// ═══════════════════════════════════════════════════════════════════════════════
// KECCAK256
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes Keccak256 hash.
///
/// Note: Keccak256 is NOT SHA3-256. They use different padding.
pub fn keccak256(input: &[u8]) -> [u8; 32] {
    use sha3::{Digest, Keccak256};

    let mut hasher = Keccak256::new();
    Digest::update(&mut hasher, input);
    hasher.finalize().into()
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHAKE256
// ═══════════════════════════════════════════════════════════════════════════════

/// Computes SHAKE256 hash with domain separation.
///
/// The domain separator is length-prefixed so outputs from different
/// protocol components never collide, even with identical inputs.
///
/// # Arguments
///
/// * `domain` - Domain separator bytes (unique per use case)
/// * `input` - Input data to hash
/// * `output_len` - Desired output length in bytes
pub fn shake256(domain: &[u8], input: &[u8], output_len: usize) -> Vec<u8> {
    let mut hasher = Shake256::default();

    hasher.update(&(domain.len() as u32).to_le_bytes());
    hasher.update(domain);
    hasher.update(input);

    let mut reader = hasher.finalize_xof();
    let mut output = vec![0u8; output_len];
    reader.read(&mut output);

    output
}
