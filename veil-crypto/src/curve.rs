//! secp256k1 scalar and point operations.
//!
//! Thin wrappers around `k256` that speak the protocol's byte-level types
//! ([`CompressedPublicKey`], [`LedgerAddress`]) and fail closed on every
//! degenerate input: zero scalars, off-curve bytes, and the point at
//! infinity all surface as typed errors rather than garbage keys.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use k256::elliptic_curve::group::Group;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::{Field, PrimeField};
use k256::{FieldBytes, NonZeroScalar, ProjectivePoint, PublicKey, Scalar, U256};
use rand::rngs::OsRng;

use veil_core::constants::ADDRESS_SCHEME_SECP256K1;
use veil_core::error::{Result, VeilError};
use veil_core::types::{CompressedPublicKey, LedgerAddress, MetaPrivateKey, ReceivingNonce};

use crate::hash::keccak256;

/// blake2b with a 256-bit output, as used by the ledger's address scheme.
type Blake2b256 = Blake2b<U32>;

// ═══════════════════════════════════════════════════════════════════════════════
// SCALAR OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Generates a cryptographically secure random non-zero scalar.
pub fn random_scalar() -> Scalar {
    *NonZeroScalar::random(&mut OsRng)
}

/// Generates a fresh receiving nonce (a random scalar in byte form).
pub fn generate_nonce() -> ReceivingNonce {
    ReceivingNonce::from_array(scalar_to_bytes(&random_scalar()))
}

/// Interprets 32 bytes as a scalar by reduction mod the group order `n`.
///
/// Used wherever the bytes come out of a hash (seed hashing, the stealth
/// tweak) or an opaque nonce. The all-but-impossible zero result is
/// rejected rather than returned.
pub fn scalar_from_bytes_reduced(bytes: &[u8; 32]) -> Result<Scalar> {
    let scalar = <Scalar as Reduce<U256>>::reduce_bytes(&FieldBytes::from(*bytes));
    if bool::from(scalar.is_zero()) {
        return Err(VeilError::InvalidScalar("reduces to zero".into()));
    }
    Ok(scalar)
}

/// Interprets 32 bytes as a canonical scalar, rejecting values >= `n`.
///
/// Used for keys that were produced by this crate and round-tripped through
/// storage; a non-canonical encoding there indicates corruption.
pub fn scalar_from_bytes_strict(bytes: &[u8; 32]) -> Result<Scalar> {
    let scalar: Option<Scalar> = Scalar::from_repr(FieldBytes::from(*bytes)).into();
    let scalar = scalar.ok_or_else(|| VeilError::InvalidScalar("non-canonical encoding".into()))?;
    if bool::from(scalar.is_zero()) {
        return Err(VeilError::InvalidScalar("zero scalar".into()));
    }
    Ok(scalar)
}

/// Returns the big-endian byte encoding of a scalar.
pub fn scalar_to_bytes(scalar: &Scalar) -> [u8; 32] {
    scalar.to_bytes().into()
}

/// Hashes a seed into a meta private key: `keccak256(seed) mod n`.
///
/// # Errors
/// Fails closed if the hash reduces to the zero scalar.
pub fn meta_private_from_seed(seed: &[u8]) -> Result<MetaPrivateKey> {
    let digest = keccak256(seed);
    let scalar = scalar_from_bytes_reduced(&digest)
        .map_err(|_| VeilError::KeyGenerationError("seed hashes to zero scalar".into()))?;
    Ok(MetaPrivateKey::from_array(scalar_to_bytes(&scalar)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// POINT OPERATIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Decodes a compressed key into a curve point.
///
/// # Errors
/// Returns [`VeilError::InvalidPoint`] if the bytes are not a valid point
/// in the prime-order subgroup.
pub fn decode_point(key: &CompressedPublicKey) -> Result<ProjectivePoint> {
    let public = PublicKey::from_sec1_bytes(key.as_bytes())
        .map_err(|_| VeilError::InvalidPoint("bytes do not decode to a curve point".into()))?;
    Ok(public.to_projective())
}

/// Encodes a curve point in compressed SEC1 form.
///
/// # Errors
/// Returns [`VeilError::InvalidPoint`] for the point at infinity, which has
/// no SEC1 encoding and never represents a usable key.
pub fn encode_point(point: &ProjectivePoint) -> Result<CompressedPublicKey> {
    if bool::from(point.is_identity()) {
        return Err(VeilError::InvalidPoint("point at infinity".into()));
    }
    let encoded = point.to_affine().to_encoded_point(true);
    CompressedPublicKey::from_bytes(encoded.as_bytes())
}

/// Derives the public key for a private scalar: `scalar · G`.
pub fn public_from_scalar(scalar: &Scalar) -> Result<CompressedPublicKey> {
    if bool::from(scalar.is_zero()) {
        return Err(VeilError::InvalidScalar("zero scalar has no public key".into()));
    }
    encode_point(&(ProjectivePoint::GENERATOR * scalar))
}

/// Hashes a curve point to a scalar: `keccak256(compress(point)) mod n`.
///
/// Both halves of the stealth protocol feed the same compressed encoding
/// through this function, so sender and recipient hash identical bytes.
pub fn hash_point_to_scalar(point: &ProjectivePoint) -> Result<Scalar> {
    let encoded = encode_point(point)?;
    let digest = keccak256(encoded.as_bytes());
    scalar_from_bytes_reduced(&digest)
        .map_err(|_| VeilError::DerivationError("shared secret hashes to zero scalar".into()))
}

// ═══════════════════════════════════════════════════════════════════════════════
// LEDGER ADDRESS DERIVATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Derives the ledger account address for a public key.
///
/// `blake2b-256(scheme_flag || compressed_pubkey)` with the secp256k1
/// scheme flag, matching the ledger's native account model.
pub fn ledger_address(key: &CompressedPublicKey) -> LedgerAddress {
    let mut hasher = Blake2b256::new();
    hasher.update([ADDRESS_SCHEME_SECP256K1]);
    hasher.update(key.as_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    LedgerAddress::from_array(digest)
}
