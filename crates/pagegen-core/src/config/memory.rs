//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use super::traits::{ConfigResult, LocalConfigSource};
use crate::types::EffectiveConfig;

/// In-memory configuration source for testing and embedding
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    config: RwLock<Option<EffectiveConfig>>,
}

impl MemoryConfigProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider holding the given configuration
    pub fn with_config(config: EffectiveConfig) -> Self {
        Self {
            config: RwLock::new(Some(config)),
        }
    }

    /// Set the configuration directly (useful for testing)
    pub fn set(&self, config: Option<EffectiveConfig>) {
        *self.config.write() = config;
    }
}

#[async_trait]
impl LocalConfigSource for MemoryConfigProvider {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> ConfigResult<Option<EffectiveConfig>> {
        Ok(self.config.read().clone())
    }

    async fn save(&self, config: &EffectiveConfig) -> ConfigResult<()> {
        *self.config.write() = Some(config.clone());
        Ok(())
    }

    async fn clear(&self) -> ConfigResult<()> {
        *self.config.write() = None;
        Ok(())
    }
}
