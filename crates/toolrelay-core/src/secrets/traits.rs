//! Secret store trait and errors

use thiserror::Error;

/// Where a secret was found, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretInfo {
    pub available: bool,
    /// Name of the store that holds it ("none" when missing)
    pub source: String,
}

impl SecretInfo {
    pub fn found(source: impl Into<String>) -> Self {
        Self {
            available: true,
            source: source.into(),
        }
    }

    pub fn missing() -> Self {
        Self {
            available: false,
            source: "none".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("secret store '{0}' is read-only")]
    ReadOnly(String),

    #[error("secret store unavailable: {0}")]
    Unavailable(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// A source of API keys
///
/// Keys are looked up by provider id. Stores may also accept raw names such
/// as `OPENAI_API_KEY`; that is up to the implementation.
pub trait SecretStore: Send + Sync {
    /// Human-readable name of this store
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<String>;

    /// Store a secret, or fail with `ReadOnly`
    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()>;

    /// Remove a secret, or fail with `ReadOnly`
    fn delete(&self, key: &str) -> SecretStoreResult<()>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn info(&self, key: &str) -> SecretInfo {
        if self.has(key) {
            SecretInfo::found(self.name())
        } else {
            SecretInfo::missing()
        }
    }
}
