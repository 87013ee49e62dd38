//! Local configuration source trait

use async_trait::async_trait;

use crate::types::EffectiveConfig;

/// User-supplied model configuration
///
/// Implementations are read fresh on every resolution; the resolver never
/// caches what they return.
#[async_trait]
pub trait LocalConfigSource: Send + Sync {
    /// Human-readable name of this source, used in log lines
    fn name(&self) -> &str;

    /// Read the stored configuration, if any
    ///
    /// A stored but incomplete configuration is returned as-is; the caller
    /// decides whether it is usable.
    async fn load(&self) -> ConfigResult<Option<EffectiveConfig>>;

    /// Replace the stored configuration
    async fn save(&self, config: &EffectiveConfig) -> ConfigResult<()>;

    /// Remove the stored configuration
    async fn clear(&self) -> ConfigResult<()>;

    /// Whether a complete configuration is stored
    async fn has_config(&self) -> bool {
        matches!(self.load().await, Ok(Some(config)) if config.is_complete())
    }
}

/// Errors that can occur during configuration operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Other(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
