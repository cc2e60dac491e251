//! Configuration provider trait

use async_trait::async_trait;

use super::file::ConfigFile;

/// Where a [`ConfigFile`] is read from and written to
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Load the configuration; a missing source yields the defaults
    async fn load(&self) -> ConfigResult<ConfigFile>;

    /// Replace the stored configuration
    async fn save(&self, config: &ConfigFile) -> ConfigResult<()>;
}

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
