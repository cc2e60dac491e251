//! Environment variable secret store

use std::collections::HashMap;
use std::env;

use once_cell::sync::Lazy;

use super::traits::{SecretStore, SecretStoreError, SecretStoreResult};

/// Prefix for toolrelay-specific overrides, e.g. `TOOLRELAY_OPENAI_API_KEY`
pub const ENV_PREFIX: &str = "TOOLRELAY_";

/// Provider id -> conventional environment variables, in lookup order
static PROVIDER_ENV_VARS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    m.insert("openai", &["OPENAI_API_KEY"]);
    m.insert("anthropic", &["ANTHROPIC_API_KEY"]);
    m.insert("gemini", &["GEMINI_API_KEY", "GOOGLE_API_KEY"]);
    m.insert("groq", &["GROQ_API_KEY"]);
    m.insert("xai", &["XAI_API_KEY"]);
    m.insert("deepseek", &["DEEPSEEK_API_KEY"]);
    m.insert("mistral", &["MISTRAL_API_KEY"]);
    m.insert("azure", &["AZURE_OPENAI_API_KEY", "AZURE_API_KEY"]);
    m.insert("openrouter", &["OPENROUTER_API_KEY"]);
    m.insert("ollama", &[]);
    m
});

/// Read-only store over the process environment
///
/// For a provider id the lookup order is `TOOLRELAY_<ID>_API_KEY`, then the
/// provider's conventional variables, then `<ID>_API_KEY`. Any other key is
/// read as a variable name directly. Empty values count as unset.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn new() -> Self {
        Self
    }

    /// Conventional variables for a provider id
    pub fn env_vars_for(provider: &str) -> Option<&'static [&'static str]> {
        PROVIDER_ENV_VARS.get(provider.to_lowercase().as_str()).copied()
    }

    fn read(name: &str) -> Option<String> {
        env::var(name).ok().filter(|v| !v.is_empty())
    }
}

impl SecretStore for EnvSecretStore {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        let upper = key.to_uppercase();

        if let Some(value) = Self::read(&format!("{}{}_API_KEY", ENV_PREFIX, upper)) {
            return Some(value);
        }

        if let Some(vars) = Self::env_vars_for(key) {
            if let Some(value) = vars.iter().find_map(|v| Self::read(v)) {
                return Some(value);
            }
        }

        Self::read(key).or_else(|| Self::read(&format!("{}_API_KEY", upper)))
    }

    fn store(&self, _key: &str, _value: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly(self.name().to_string()))
    }

    fn delete(&self, _key: &str) -> SecretStoreResult<()> {
        Err(SecretStoreError::ReadOnly(self.name().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each test uses its own variable names; the environment is process-wide.

    #[test]
    fn test_read_only() {
        let store = EnvSecretStore::new();
        assert!(matches!(store.store("k", "v"), Err(SecretStoreError::ReadOnly(_))));
        assert!(matches!(store.delete("k"), Err(SecretStoreError::ReadOnly(_))));
    }

    #[test]
    fn test_direct_variable() {
        env::set_var("TOOLRELAY_TEST_DIRECT_SECRET", "direct");
        let store = EnvSecretStore::new();
        assert_eq!(store.get("TOOLRELAY_TEST_DIRECT_SECRET"), Some("direct".to_string()));
        env::remove_var("TOOLRELAY_TEST_DIRECT_SECRET");
    }

    #[test]
    fn test_provider_mapping_and_prefix_override() {
        env::set_var("XAI_API_KEY", "xai-conventional");
        let store = EnvSecretStore::new();
        assert_eq!(store.get("xai"), Some("xai-conventional".to_string()));
        assert_eq!(store.get("XAI"), Some("xai-conventional".to_string()));

        env::set_var("TOOLRELAY_XAI_API_KEY", "xai-override");
        assert_eq!(store.get("xai"), Some("xai-override".to_string()));
        assert_eq!(store.info("xai").source, "env");

        env::remove_var("TOOLRELAY_XAI_API_KEY");
        env::remove_var("XAI_API_KEY");
    }

    #[test]
    fn test_empty_and_missing() {
        env::set_var("TOOLRELAY_TEST_EMPTY_SECRET", "");
        let store = EnvSecretStore::new();
        assert_eq!(store.get("TOOLRELAY_TEST_EMPTY_SECRET"), None);
        assert!(!store.has("nonexistent_provider_xyz"));
        assert!(!store.info("nonexistent_provider_xyz").available);
        env::remove_var("TOOLRELAY_TEST_EMPTY_SECRET");
        assert_eq!(EnvSecretStore::env_vars_for("ollama"), Some(&[][..]));
    }
}
