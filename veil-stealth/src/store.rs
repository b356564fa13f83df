//! The meta account store.
//!
//! One [`MetaKeyPair`] per wallet identity, plus every recovered one-time
//! account and the resumable sync cursor. This is the single source of
//! truth consumed by the sync engine (writer) and the balance aggregator
//! (reader), and the only place private-key bytes live before signing.
//!
//! All operations lock at identity granularity; syncs and reads for
//! different identities never contend.

use std::collections::BTreeMap;

use dashmap::DashMap;
use tracing::{debug, info, instrument};

use veil_core::error::{Result, VeilError};
use veil_core::types::{
    CompressedPublicKey, LedgerAddress, MetaKeyPair, ReceivingAddress, RecoveredAccount,
    SyncCursor,
};
use veil_crypto::{
    generate_nonce, meta_private_from_seed, public_from_scalar, scalar_from_bytes_strict,
};

/// Per-identity state held by the store.
pub(crate) struct MetaAccount {
    pub(crate) keys: MetaKeyPair,
    pub(crate) recovered: BTreeMap<LedgerAddress, RecoveredAccount>,
    pub(crate) cursor: SyncCursor,
}

/// Identity-keyed store of meta key pairs and recovered accounts.
///
/// Mutators are exclusive and atomic-from-the-outside per identity; the
/// `DashMap` shard lock is held for the duration of each operation.
pub struct MetaAccountStore {
    identities: DashMap<String, MetaAccount>,
}

impl MetaAccountStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            identities: DashMap::new(),
        }
    }

    /// Generates a fresh meta key pair for an identity.
    ///
    /// `ownerPriv = keccak256(seed) mod n`, with a fresh receiving nonce.
    /// Any prior key for the identity is overwritten, recovered accounts and
    /// cursor included; callers that want to keep them must export first.
    ///
    /// Returns the new shareable receiving address.
    #[instrument(skip(self, seed))]
    pub fn generate(&self, seed: &[u8], identity: &str) -> Result<ReceivingAddress> {
        let private = meta_private_from_seed(seed)?;
        let scalar = scalar_from_bytes_strict(private.as_array())?;
        let public = public_from_scalar(&scalar)?;
        let nonce = generate_nonce();

        let keys = MetaKeyPair::new(private, public, nonce);
        let address = keys.receiving_address();

        let replaced = self
            .identities
            .insert(
                identity.to_owned(),
                MetaAccount {
                    keys,
                    recovered: BTreeMap::new(),
                    cursor: SyncCursor::genesis(),
                },
            )
            .is_some();

        info!(identity, replaced, "Generated meta key pair");
        Ok(address)
    }

    /// Regenerates the receiving nonce only; owner keys are unchanged.
    ///
    /// Returns the new shareable receiving address.
    #[instrument(skip(self))]
    pub fn rotate_receiving_address(&self, identity: &str) -> Result<ReceivingAddress> {
        let mut account = self.account_mut(identity)?;
        account.keys.receiving_nonce = generate_nonce();
        let address = account.keys.receiving_address();

        info!(identity, "Rotated receiving address");
        Ok(address)
    }

    /// Returns the current shareable receiving address.
    pub fn receiving_address(&self, identity: &str) -> Result<ReceivingAddress> {
        Ok(self.account(identity)?.keys.receiving_address())
    }

    /// Returns the identity's meta public key.
    pub fn meta_public_key(&self, identity: &str) -> Result<CompressedPublicKey> {
        Ok(self.account(identity)?.keys.public)
    }

    /// Returns a clone of the identity's complete key pair.
    ///
    /// # Security
    /// The clone carries the owner private scalar; it zeroizes on drop, but
    /// callers must not log or persist it outside the vault.
    pub fn meta_keypair(&self, identity: &str) -> Result<MetaKeyPair> {
        Ok(self.account(identity)?.keys.clone())
    }

    /// Records a recovered account, keyed by its one-time address.
    ///
    /// Idempotent: inserting an address that is already present is a no-op.
    /// Returns true if the account was newly inserted.
    #[instrument(skip(self, account), fields(address = %account.address))]
    pub fn record_recovered(&self, identity: &str, account: RecoveredAccount) -> Result<bool> {
        let mut entry = self.account_mut(identity)?;
        if entry.recovered.contains_key(&account.address) {
            return Ok(false);
        }

        debug!(identity, address = %account.address, "Recorded recovered account");
        entry.recovered.insert(account.address, account);
        Ok(true)
    }

    /// Removes recovered accounts by address. Unknown addresses are ignored.
    ///
    /// Returns the number of accounts actually removed.
    #[instrument(skip(self, addresses))]
    pub fn remove_recovered(&self, identity: &str, addresses: &[LedgerAddress]) -> Result<usize> {
        let mut entry = self.account_mut(identity)?;
        let mut removed = 0;
        for address in addresses {
            if entry.recovered.remove(address).is_some() {
                removed += 1;
            }
        }

        info!(identity, removed, "Removed recovered accounts");
        Ok(removed)
    }

    /// Returns the identity's recovered accounts, ordered by address.
    pub fn recovered_accounts(&self, identity: &str) -> Result<Vec<RecoveredAccount>> {
        Ok(self.account(identity)?.recovered.values().cloned().collect())
    }

    /// Returns the number of recovered accounts for an identity.
    pub fn recovered_count(&self, identity: &str) -> Result<usize> {
        Ok(self.account(identity)?.recovered.len())
    }

    /// Returns the identity's sync cursor.
    pub fn cursor(&self, identity: &str) -> Result<SyncCursor> {
        Ok(self.account(identity)?.cursor.clone())
    }

    /// Persists a new sync cursor for the identity.
    pub fn set_cursor(&self, identity: &str, cursor: SyncCursor) -> Result<()> {
        self.account_mut(identity)?.cursor = cursor;
        Ok(())
    }

    /// Explicitly rewinds the cursor to genesis (full re-scan on next sync).
    #[instrument(skip(self))]
    pub fn reset_cursor(&self, identity: &str) -> Result<()> {
        self.account_mut(identity)?.cursor = SyncCursor::genesis();
        info!(identity, "Reset sync cursor");
        Ok(())
    }

    /// Returns true if a meta key exists for the identity.
    pub fn contains(&self, identity: &str) -> bool {
        self.identities.contains_key(identity)
    }

    /// Returns all identity strings with a generated key.
    pub fn identities(&self) -> Vec<String> {
        self.identities.iter().map(|e| e.key().clone()).collect()
    }

    /// Returns the number of identities in the store.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// Returns true if the store holds no identities.
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub(crate) fn account(
        &self,
        identity: &str,
    ) -> Result<dashmap::mapref::one::Ref<'_, String, MetaAccount>> {
        self.identities
            .get(identity)
            .ok_or_else(|| VeilError::NoMetaKey(identity.to_owned()))
    }

    pub(crate) fn account_mut(
        &self,
        identity: &str,
    ) -> Result<dashmap::mapref::one::RefMut<'_, String, MetaAccount>> {
        self.identities
            .get_mut(identity)
            .ok_or_else(|| VeilError::NoMetaKey(identity.to_owned()))
    }

    pub(crate) fn insert_account(&self, identity: String, account: MetaAccount) {
        self.identities.insert(identity, account);
    }
}

impl Default for MetaAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetaAccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaAccountStore")
            .field("identities", &self.identities.len())
            .finish()
    }
}
