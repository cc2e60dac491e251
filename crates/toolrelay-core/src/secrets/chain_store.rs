//! Secret store that falls back through several stores

use std::sync::Arc;

use super::traits::{SecretInfo, SecretStore, SecretStoreError, SecretStoreResult};

/// Reads try each store in order; writes go to the first store
pub struct ChainSecretStore {
    stores: Vec<Arc<dyn SecretStore>>,
}

impl ChainSecretStore {
    pub fn new(stores: Vec<Arc<dyn SecretStore>>) -> Self {
        Self { stores }
    }

    /// Append a lower-priority store
    pub fn then(mut self, store: Arc<dyn SecretStore>) -> Self {
        self.stores.push(store);
        self
    }

    pub fn stores(&self) -> &[Arc<dyn SecretStore>] {
        &self.stores
    }

    fn write_store(&self) -> SecretStoreResult<&Arc<dyn SecretStore>> {
        self.stores
            .first()
            .ok_or_else(|| SecretStoreError::Unavailable("empty secret chain".to_string()))
    }
}

impl SecretStore for ChainSecretStore {
    fn name(&self) -> &str {
        "chain"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.stores.iter().find_map(|s| s.get(key))
    }

    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()> {
        self.write_store()?.store(key, value)
    }

    /// Deletes from every writable store holding the key
    fn delete(&self, key: &str) -> SecretStoreResult<()> {
        for store in self.stores.iter().filter(|s| s.has(key)) {
            match store.delete(key) {
                Ok(()) | Err(SecretStoreError::ReadOnly(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn info(&self, key: &str) -> SecretInfo {
        self.stores
            .iter()
            .find(|s| s.has(key))
            .map(|s| SecretInfo::found(s.name()))
            .unwrap_or_else(SecretInfo::missing)
    }
}

impl std::fmt::Debug for ChainSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.stores.iter().map(|s| s.name()).collect();
        f.debug_struct("ChainSecretStore").field("stores", &names).finish()
    }
}
