//! API-key lookup for hosted providers
//!
//! `GenaiProvider` asks a `SecretStore` for the key of the provider it is
//! talking to, keyed by provider id ("openai", "anthropic", ...).
//! - `EnvSecretStore` reads environment variables
//! - `MemorySecretStore` holds keys in process, mostly for tests
//! - `ChainSecretStore` tries several stores in order

mod traits;
mod env_store;
mod memory_store;
mod chain_store;

pub use traits::{SecretStore, SecretInfo, SecretStoreError, SecretStoreResult};
pub use env_store::{EnvSecretStore, ENV_PREFIX};
pub use memory_store::MemorySecretStore;
pub use chain_store::ChainSecretStore;

use std::sync::Arc;

/// The store used when the caller does not supply one
pub fn default_secret_store() -> Arc<dyn SecretStore> {
    Arc::new(EnvSecretStore::new())
}
