//! Sealed store snapshots.
//!
//! The logical persisted state per identity is
//! `{ownerPriv, ownerPub, receivingNonce, recoveredAccounts[], syncCursor}`.
//! Public halves travel in clear JSON; every private scalar is sealed with
//! AES-256-GCM under a password-derived key, so a snapshot at rest never
//! contains plaintext key material.
//!
//! Key derivation: `SHAKE256(DOMAIN_VAULT_KEY, password || salt, 32)` with a
//! fresh random salt and nonce per export.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use veil_core::constants::{DOMAIN_VAULT_KEY, PROTOCOL_VERSION};
use veil_core::error::{Result, VeilError};
use veil_core::types::{
    CompressedPublicKey, EventId, LedgerAddress, MetaKeyPair, MetaPrivateKey, OneTimePrivateKey,
    ReceivingAddress, ReceivingNonce, RecoveredAccount, SyncCursor,
};
use veil_crypto::{public_from_scalar, scalar_from_bytes_strict, shake256};

use crate::store::{MetaAccount, MetaAccountStore};

// ═══════════════════════════════════════════════════════════════════════════════
// SNAPSHOT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Encrypted secret half of a snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SealedSecrets {
    /// AES-256-GCM ciphertext over the serialized secret material
    #[serde(with = "hex")]
    pub ciphertext: Vec<u8>,
    /// GCM nonce used for this seal
    #[serde(with = "hex")]
    pub nonce: [u8; 12],
    /// Salt fed into the key derivation
    #[serde(with = "hex")]
    pub salt: [u8; 32],
}

/// A complete, storage-agnostic snapshot of one identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    /// Snapshot format version
    pub version: u8,
    /// The wallet identity string this snapshot belongs to
    pub identity: String,
    /// Owner meta public key (clear)
    pub owner_pub: CompressedPublicKey,
    /// Current receiving nonce (clear; it travels in the address string anyway)
    pub receiving_nonce: ReceivingNonce,
    /// Resumable sync cursor
    pub cursor: SyncCursor,
    /// Recovered one-time addresses (clear; the keys live in `secrets`)
    pub recovered_addresses: Vec<LedgerAddress>,
    /// Sealed private scalars
    pub secrets: SealedSecrets,
}

/// Plaintext secret material, only ever alive inside seal/open.
#[derive(Serialize, Deserialize)]
struct SecretMaterial {
    owner_priv: String,
    accounts: Vec<SecretAccount>,
}

#[derive(Serialize, Deserialize)]
struct SecretAccount {
    address: LedgerAddress,
    private_key: String,
    event_id: EventId,
    recovered_at: DateTime<Utc>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEAL / OPEN
// ═══════════════════════════════════════════════════════════════════════════════

fn derive_vault_key(password: &str, salt: &[u8; 32]) -> Vec<u8> {
    let mut input = Vec::with_capacity(password.len() + salt.len());
    input.extend_from_slice(password.as_bytes());
    input.extend_from_slice(salt);
    let key = shake256(DOMAIN_VAULT_KEY, &input, 32);
    input.zeroize();
    key
}

fn seal(material: &SecretMaterial, password: &str) -> Result<SealedSecrets> {
    let mut salt = [0u8; 32];
    let mut nonce = [0u8; 12];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let mut key = derive_vault_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    let mut plaintext = serde_json::to_vec(material)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|e| VeilError::VaultSealFailed(e.to_string()))?;

    plaintext.zeroize();
    key.zeroize();

    Ok(SealedSecrets {
        ciphertext,
        nonce,
        salt,
    })
}

fn open(sealed: &SealedSecrets, password: &str) -> Result<SecretMaterial> {
    let mut key = derive_vault_key(password, &sealed.salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));

    let mut plaintext = cipher
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
        .map_err(|_| VeilError::VaultOpenFailed("wrong password or tampered payload".into()))?;
    key.zeroize();

    let material = serde_json::from_slice(&plaintext)?;
    plaintext.zeroize();
    Ok(material)
}

// ═══════════════════════════════════════════════════════════════════════════════
// STORE INTEGRATION
// ═══════════════════════════════════════════════════════════════════════════════

impl MetaAccountStore {
    /// Exports one identity as a sealed snapshot.
    pub fn export_identity(&self, identity: &str, password: &str) -> Result<IdentitySnapshot> {
        let account = self.account(identity)?;

        let material = SecretMaterial {
            owner_priv: hex::encode(account.keys.private.as_bytes()),
            accounts: account
                .recovered
                .values()
                .map(|a| SecretAccount {
                    address: a.address,
                    private_key: hex::encode(a.private_key.as_bytes()),
                    event_id: a.event_id.clone(),
                    recovered_at: a.recovered_at,
                })
                .collect(),
        };

        let secrets = seal(&material, password)?;

        Ok(IdentitySnapshot {
            version: PROTOCOL_VERSION,
            identity: identity.to_owned(),
            owner_pub: account.keys.public,
            receiving_nonce: account.keys.receiving_nonce,
            cursor: account.cursor.clone(),
            recovered_addresses: account.recovered.keys().copied().collect(),
            secrets,
        })
    }

    /// Restores an identity from a sealed snapshot, overwriting any existing
    /// state for that identity.
    ///
    /// # Errors
    /// Fails closed on a wrong password, a tampered payload, a version
    /// mismatch, or secret material that does not match the clear public key.
    pub fn import_identity(&self, snapshot: &IdentitySnapshot, password: &str) -> Result<()> {
        if snapshot.version != PROTOCOL_VERSION {
            return Err(VeilError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: snapshot.version,
            });
        }

        let material = open(&snapshot.secrets, password)?;

        let priv_bytes = hex::decode(&material.owner_priv)?;
        let private = MetaPrivateKey::from_bytes(&priv_bytes)?;

        // The sealed scalar must reproduce the clear public key
        let scalar = scalar_from_bytes_strict(private.as_array())?;
        if public_from_scalar(&scalar)? != snapshot.owner_pub {
            return Err(VeilError::VaultOpenFailed(
                "secret material does not match the public key".into(),
            ));
        }

        let mut recovered = std::collections::BTreeMap::new();
        for entry in &material.accounts {
            let key_bytes = hex::decode(&entry.private_key)?;
            recovered.insert(
                entry.address,
                RecoveredAccount {
                    address: entry.address,
                    private_key: OneTimePrivateKey::from_bytes(&key_bytes)?,
                    event_id: entry.event_id.clone(),
                    recovered_at: entry.recovered_at,
                },
            );
        }

        self.insert_account(
            snapshot.identity.clone(),
            MetaAccount {
                keys: MetaKeyPair::new(private, snapshot.owner_pub, snapshot.receiving_nonce),
                recovered,
                cursor: snapshot.cursor.clone(),
            },
        );

        Ok(())
    }
}

impl IdentitySnapshot {
    /// Returns the receiving address encoded in this snapshot.
    pub fn receiving_address(&self) -> ReceivingAddress {
        ReceivingAddress::new(self.receiving_nonce, self.owner_pub)
    }
}
