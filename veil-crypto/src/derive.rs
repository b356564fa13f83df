//! Stealth key derivation and recovery.
//!
//! The two halves of the protocol, parameterized by which side supplies the
//! ephemeral scalar:
//!
//! ```text
//! sender:    derive_stealth_public(ownerPub, ephPriv)
//!              -> stealthPub = ownerPub + H(ephPriv·ownerPub)·G
//! recipient: recover_stealth_private(ownerPriv, ephPub)
//!              -> stealthPriv = ownerPriv + H(ownerPriv·ephPub)  (mod n)
//! ```
//!
//! ECDH commutativity makes both sides hash the same point, so
//! `stealthPriv · G == stealthPub` exactly when the event was created for
//! this owner. That equality, checked through the derived ledger address,
//! is the sync engine's only match criterion.

use k256::elliptic_curve::Field;
use k256::{ProjectivePoint, Scalar};

use veil_core::error::{Result, VeilError};
use veil_core::types::{CompressedPublicKey, LedgerAddress, MetaPrivateKey, OneTimePrivateKey};

use crate::curve::{
    decode_point, encode_point, hash_point_to_scalar, ledger_address, public_from_scalar,
    scalar_from_bytes_strict, scalar_to_bytes,
};

// ═══════════════════════════════════════════════════════════════════════════════
// SENDER SIDE
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything a payer needs after deriving a one-time destination.
///
/// The caller is responsible for publishing `(ephemeral_pub, address)` as a
/// ledger event so the owner can later recover the matching private key.
#[derive(Clone, Debug)]
pub struct StealthDerivation {
    /// The one-time public key the payment is locked to
    pub stealth_pub: CompressedPublicKey,
    /// The ephemeral public key to publish alongside the payment
    pub ephemeral_pub: CompressedPublicKey,
    /// The ledger address of the one-time destination
    pub address: LedgerAddress,
}

/// Derives a one-time stealth destination from an owner's meta public key.
///
/// Deterministic for fixed inputs. The fresh-ephemeral and embedded-nonce
/// payment flows both route through here; only the origin of
/// `ephemeral_priv` differs.
///
/// # Errors
/// - [`VeilError::InvalidPoint`] if `owner_pub` does not decode to a
///   subgroup point
/// - [`VeilError::DerivationError`] on a degenerate ephemeral scalar
pub fn derive_stealth_public(
    owner_pub: &CompressedPublicKey,
    ephemeral_priv: &Scalar,
) -> Result<StealthDerivation> {
    if bool::from(ephemeral_priv.is_zero()) {
        return Err(VeilError::DerivationError("zero ephemeral scalar".into()));
    }

    let owner_point = decode_point(owner_pub)?;

    // ECDH, then hash the compressed point to the tweak scalar
    let shared = owner_point * ephemeral_priv;
    let tweak = hash_point_to_scalar(&shared)?;

    let stealth_point = owner_point + ProjectivePoint::GENERATOR * tweak;
    let stealth_pub = encode_point(&stealth_point)?;
    let ephemeral_pub = encode_point(&(ProjectivePoint::GENERATOR * ephemeral_priv))?;
    let address = ledger_address(&stealth_pub);

    Ok(StealthDerivation {
        stealth_pub,
        ephemeral_pub,
        address,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECIPIENT SIDE
// ═══════════════════════════════════════════════════════════════════════════════

/// A reconstructed one-time key with its public half and ledger address.
#[derive(Debug)]
pub struct RecoveredKey {
    /// The one-time public key (`private_key · G`)
    pub public_key: CompressedPublicKey,
    /// The reconstructed spending key
    pub private_key: OneTimePrivateKey,
    /// The ledger address the key controls
    pub address: LedgerAddress,
}

/// Recovers the one-time private key for an observed ephemeral public key.
///
/// Guarantee: when `ephemeral_pub` came from `derive_stealth_public` against
/// this owner's public key, the returned key satisfies
/// `private_key · G == stealth_pub` and `address` equals the published
/// destination. For unrelated ephemeral keys the result is a valid but
/// non-matching key; the caller detects that by address comparison.
///
/// # Errors
/// - [`VeilError::InvalidPoint`] if `ephemeral_pub` does not decode to a
///   subgroup point
/// - [`VeilError::InvalidScalar`] if the stored owner key is corrupt or the
///   derived scalar is degenerate
pub fn recover_stealth_private(
    owner_priv: &MetaPrivateKey,
    ephemeral_pub: &CompressedPublicKey,
) -> Result<RecoveredKey> {
    let owner_scalar = scalar_from_bytes_strict(owner_priv.as_array())?;
    let ephemeral_point = decode_point(ephemeral_pub)?;

    // Same point as the sender's ECDH, by commutativity
    let shared = ephemeral_point * owner_scalar;
    let tweak = hash_point_to_scalar(&shared)?;

    let stealth_scalar = owner_scalar + tweak;
    if bool::from(stealth_scalar.is_zero()) {
        return Err(VeilError::InvalidScalar(
            "derived stealth key is zero".into(),
        ));
    }

    let public_key = public_from_scalar(&stealth_scalar)?;
    let address = ledger_address(&public_key);
    let private_key = OneTimePrivateKey::from_array(scalar_to_bytes(&stealth_scalar));

    Ok(RecoveredKey {
        public_key,
        private_key,
        address,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// VERIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Verifies that an observed `(ephemeral_pub, address)` pair belongs to
/// this owner by re-deriving the address and comparing in constant time.
pub fn verify_stealth_address(
    owner_priv: &MetaPrivateKey,
    ephemeral_pub: &CompressedPublicKey,
    expected_address: &LedgerAddress,
) -> Result<bool> {
    let recovered = recover_stealth_private(owner_priv, ephemeral_pub)?;
    Ok(subtle::ConstantTimeEq::ct_eq(
        recovered.address.as_bytes(),
        expected_address.as_bytes(),
    )
    .into())
}
