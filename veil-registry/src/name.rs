//! In-memory name registry.
//!
//! Name → meta public key, with the registration side included so the
//! name payment flow is exercisable end-to-end. Lookup stays a plain
//! key-value interface; everything else about naming is out of scope.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use veil_core::error::Result;
use veil_core::traits::NameRegistry;
use veil_core::types::CompressedPublicKey;

/// In-memory name → meta public key registry.
#[derive(Debug, Default)]
pub struct MemoryNameRegistry {
    names: DashMap<String, CompressedPublicKey>,
}

impl MemoryNameRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a name for lookup (trimmed, lowercase).
    fn normalize(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Registers (or replaces) a name binding.
    pub fn register(&self, name: &str, owner_pub: CompressedPublicKey) {
        let normalized = Self::normalize(name);
        debug!(name = %normalized, "Registered name");
        self.names.insert(normalized, owner_pub);
    }

    /// Removes a name binding. Returns true if it existed.
    pub fn unregister(&self, name: &str) -> bool {
        self.names.remove(&Self::normalize(name)).is_some()
    }

    /// Returns the number of registered names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no names are registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[async_trait]
impl NameRegistry for MemoryNameRegistry {
    async fn resolve(&self, name: &str) -> Result<Option<CompressedPublicKey>> {
        Ok(self.names.get(&Self::normalize(name)).map(|e| *e.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_crypto::{public_from_scalar, random_scalar};

    fn test_key() -> CompressedPublicKey {
        public_from_scalar(&random_scalar()).unwrap()
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let registry = MemoryNameRegistry::new();
        let key = test_key();
        registry.register("alice", key);

        assert_eq!(registry.resolve("alice").await.unwrap(), Some(key));
        assert_eq!(registry.resolve("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resolve_is_case_insensitive() {
        let registry = MemoryNameRegistry::new();
        let key = test_key();
        registry.register("Alice", key);

        assert_eq!(registry.resolve("  aLiCe ").await.unwrap(), Some(key));
    }

    #[tokio::test]
    async fn test_register_replaces() {
        let registry = MemoryNameRegistry::new();
        let key1 = test_key();
        let key2 = test_key();

        registry.register("alice", key1);
        registry.register("alice", key2);

        assert_eq!(registry.resolve("alice").await.unwrap(), Some(key2));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_unregister() {
        let registry = MemoryNameRegistry::new();
        registry.register("alice", test_key());

        assert!(registry.unregister("alice"));
        assert!(!registry.unregister("alice"));
        assert_eq!(registry.resolve("alice").await.unwrap(), None);
    }
}
