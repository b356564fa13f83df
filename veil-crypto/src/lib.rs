//! # Veil Crypto
//!
//! secp256k1 curve primitives and stealth key derivation for the Veil
//! protocol.
//!
//! ## Construction
//!
//! Classic single-key stealth addressing over secp256k1:
//!
//! ```text
//! sender:    shared = ephPriv · ownerPub          (ECDH)
//!            h = keccak256(compress(shared)) mod n
//!            stealthPub = ownerPub + h·G
//!
//! recipient: shared' = ownerPriv · ephPub         (same point, by commutativity)
//!            stealthPriv = (ownerPriv + h) mod n
//! ```
//!
//! Ledger addresses follow the ledger's native account model:
//! `blake2b-256(scheme_flag || compressed_pubkey)`.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod curve;
pub mod derive;
pub mod hash;

pub use curve::{
    decode_point, encode_point, generate_nonce, hash_point_to_scalar, ledger_address,
    meta_private_from_seed, public_from_scalar, random_scalar, scalar_from_bytes_reduced,
    scalar_from_bytes_strict, scalar_to_bytes,
};
pub use derive::{
    derive_stealth_public, recover_stealth_private, verify_stealth_address, RecoveredKey,
    StealthDerivation,
};
pub use hash::{keccak256, shake256};

// Callers that need raw scalar arithmetic use the curve's own type.
pub use k256::Scalar;
