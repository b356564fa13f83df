//! Stealth payment creation (sender side).
//!
//! Two call modes over the same derivation core:
//!
//! - **Name flow**: the payer resolves a registered name to the owner's
//!   meta public key and generates a *fresh random* ephemeral scalar per
//!   payment. Repeated payments to the same name are unlinkable.
//! - **Direct-address flow**: the shared receiving-address string already
//!   embeds the ephemeral scalar (the receiving nonce), so every payer
//!   holding the same string derives the *same* destination. Unlinkability
//!   for this flow comes from the recipient rotating the nonce, not from
//!   the payer. Treat a receiving-address string as single-use-per-rotation
//!   when that matters.

use serde::{Deserialize, Serialize};

use veil_core::error::{Result, VeilError};
use veil_core::traits::NameRegistry;
use veil_core::types::{
    CompressedPublicKey, EventId, LedgerAddress, ReceivingAddress, StealthEvent,
};
use veil_crypto::{derive_stealth_public, random_scalar, scalar_from_bytes_reduced, Scalar};

/// Stealth payment: the destination to send to and the event to publish.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StealthPayment {
    /// The one-time ledger address to send funds to
    pub address: LedgerAddress,
    /// The one-time public key the destination is locked to
    pub stealth_pub: CompressedPublicKey,
    /// The ephemeral public key to publish alongside the payment
    pub ephemeral_pub: CompressedPublicKey,
}

impl StealthPayment {
    /// Builds the ledger event for this payment.
    ///
    /// Publishing the event is the transaction layer's job; without it the
    /// recipient's scan can never discover the payment.
    pub fn to_event(&self, id: EventId) -> StealthEvent {
        StealthEvent::new(id, self.ephemeral_pub, self.address)
    }
}

/// Derives a payment destination with an explicit ephemeral scalar.
///
/// The two public flows route through here; tests use it for determinism.
pub fn pay_with_ephemeral(
    owner_pub: &CompressedPublicKey,
    ephemeral: &Scalar,
) -> Result<StealthPayment> {
    let derived = derive_stealth_public(owner_pub, ephemeral)?;
    Ok(StealthPayment {
        address: derived.address,
        stealth_pub: derived.stealth_pub,
        ephemeral_pub: derived.ephemeral_pub,
    })
}

/// Derives a payment destination with a fresh random ephemeral scalar.
pub fn pay_to_public_key(owner_pub: &CompressedPublicKey) -> Result<StealthPayment> {
    pay_with_ephemeral(owner_pub, &random_scalar())
}

/// Derives a payment destination from a shared receiving-address string.
///
/// The embedded nonce serves as the ephemeral scalar, so the destination is
/// fixed until the recipient rotates their address (see module docs).
///
/// # Errors
/// Surfaces decode errors ("invalid recipient") without panicking.
pub fn pay_to_receiving_address(encoded: &str) -> Result<StealthPayment> {
    let address = ReceivingAddress::decode(encoded)?;
    let ephemeral = scalar_from_bytes_reduced(address.nonce.as_array())?;
    pay_with_ephemeral(&address.owner_pub, &ephemeral)
}

/// Resolves a registered name and derives a fresh unlinkable destination.
///
/// # Errors
/// [`VeilError::NameNotFound`] if the registry has no entry for `name`.
pub async fn pay_to_name(registry: &dyn NameRegistry, name: &str) -> Result<StealthPayment> {
    let owner_pub = registry
        .resolve(name)
        .await?
        .ok_or_else(|| VeilError::NameNotFound(name.to_owned()))?;
    pay_to_public_key(&owner_pub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MetaAccountStore;
    use veil_registry::MemoryNameRegistry;

    fn recipient() -> (MetaAccountStore, ReceivingAddress) {
        let store = MetaAccountStore::new();
        let address = store.generate(b"recipient-sig", "r").unwrap();
        (store, address)
    }

    #[test]
    fn test_direct_flow_is_deterministic_per_address_string() {
        let (_store, address) = recipient();
        let text = address.encode();

        // Every payer holding the same string lands on the same destination
        let p1 = pay_to_receiving_address(&text).unwrap();
        let p2 = pay_to_receiving_address(&text).unwrap();
        assert_eq!(p1.address, p2.address);
        assert_eq!(p1.ephemeral_pub, p2.ephemeral_pub);
    }

    #[test]
    fn test_rotation_moves_the_direct_flow_destination() {
        let (store, address) = recipient();
        let before = pay_to_receiving_address(&address.encode()).unwrap();

        let rotated = store.rotate_receiving_address("r").unwrap();
        let after = pay_to_receiving_address(&rotated.encode()).unwrap();

        assert_ne!(before.address, after.address);
    }

    #[test]
    fn test_fresh_ephemeral_flow_is_unlinkable() {
        let (_store, address) = recipient();

        let p1 = pay_to_public_key(&address.owner_pub).unwrap();
        let p2 = pay_to_public_key(&address.owner_pub).unwrap();
        assert_ne!(p1.address, p2.address);
    }

    #[test]
    fn test_malformed_recipient_is_a_decode_error() {
        let err = pay_to_receiving_address("not-an-address").unwrap_err();
        assert!(err.is_decode_error());
    }

    #[test]
    fn test_event_carries_payment_data() {
        let (_store, address) = recipient();
        let payment = pay_to_public_key(&address.owner_pub).unwrap();
        let event = payment.to_event(EventId::new("ev-1"));

        assert_eq!(event.ephemeral_pub, payment.ephemeral_pub);
        assert_eq!(event.resulting_address, payment.address);
        assert!(event.validate().is_ok());
    }

    #[tokio::test]
    async fn test_pay_to_name() {
        let (_store, address) = recipient();
        let registry = MemoryNameRegistry::new();
        registry.register("alice", address.owner_pub);

        let payment = pay_to_name(&registry, "alice").await.unwrap();
        assert!(!payment.address.is_zero());
    }

    #[tokio::test]
    async fn test_pay_to_unknown_name() {
        let registry = MemoryNameRegistry::new();
        let result = pay_to_name(&registry, "nobody").await;
        assert!(matches!(result, Err(VeilError::NameNotFound(_))));
    }
}
