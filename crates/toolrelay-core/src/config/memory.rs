//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use super::file::ConfigFile;
use super::traits::{ConfigProvider, ConfigResult};

/// Holds one configuration in memory, for tests and embedders
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    config: RwLock<ConfigFile>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ConfigFile) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn load(&self) -> ConfigResult<ConfigFile> {
        Ok(self.config.read().clone())
    }

    async fn save(&self, config: &ConfigFile) -> ConfigResult<()> {
        config.validate()?;
        *self.config.write() = config.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[tokio::test]
    async fn test_save_and_load() {
        let provider = MemoryConfigProvider::new();
        assert_eq!(provider.load().await.unwrap(), ConfigFile::default());

        let mut config = ConfigFile::default();
        config.provider.name = "mock".to_string();
        config.coordinator.parallel_tools = true;
        provider.save(&config).await.unwrap();

        let loaded = provider.load().await.unwrap();
        assert_eq!(loaded.provider.name, "mock");
        assert!(loaded.coordinator.parallel_tools);
    }

    #[tokio::test]
    async fn test_invalid_config_is_not_stored() {
        let provider = MemoryConfigProvider::new();
        let mut config = ConfigFile::default();
        config.provider.model.clear();

        let err = provider.save(&config).await.unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert_eq!(provider.load().await.unwrap(), ConfigFile::default());
    }
}
