//! In-memory secret store

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::{SecretStore, SecretStoreResult};

/// Read-write store held in process; secrets vanish with it
///
/// ```
/// use toolrelay_core::secrets::{MemorySecretStore, SecretStore};
///
/// let store = MemorySecretStore::new().with_secret("openai", "sk-test");
/// assert_eq!(store.get("openai"), Some("sk-test".to_string()));
/// ```
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_secret(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.write().insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.secrets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.read().is_empty()
    }
}

impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.secrets.read().get(key).cloned()
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        self.secrets.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        self.secrets.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_get_delete() {
        let store = MemorySecretStore::new();
        assert!(store.is_empty());

        store.store("anthropic", "sk-ant").unwrap();
        assert_eq!(store.get("anthropic"), Some("sk-ant".to_string()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.info("anthropic").source, "memory");

        store.delete("anthropic").unwrap();
        assert!(!store.has("anthropic"));
        // Deleting twice is fine
        store.delete("anthropic").unwrap();
    }
}
