//! Client-side settings

use std::env;

/// Storage service used when `PAGEGEN_STORAGE_URL` is unset
pub const DEFAULT_STORAGE_URL: &str = "http://127.0.0.1:8787";
/// Sampling temperature sent with every completion request
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Well-known blob key holding the encrypted fallback configuration
pub const DEFAULT_REMOTE_CONFIG_KEY: &str = "config";

/// Settings shared by the completion client, the resolver and the blob client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Base URL of the blob store service
    pub storage_base_url: String,
    /// Sampling temperature for completion requests
    pub temperature: f32,
    /// Blob key of the encrypted fallback configuration
    pub remote_config_key: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            storage_base_url: DEFAULT_STORAGE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            remote_config_key: DEFAULT_REMOTE_CONFIG_KEY.to_string(),
        }
    }
}

impl ClientSettings {
    /// Defaults overridden by `PAGEGEN_STORAGE_URL`, `PAGEGEN_TEMPERATURE`
    /// and `PAGEGEN_REMOTE_CONFIG_KEY`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            storage_base_url: env_non_empty("PAGEGEN_STORAGE_URL").unwrap_or(defaults.storage_base_url),
            temperature: env_non_empty("PAGEGEN_TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.temperature),
            remote_config_key: env_non_empty("PAGEGEN_REMOTE_CONFIG_KEY")
                .unwrap_or(defaults.remote_config_key),
        }
    }

    pub fn with_storage_base_url(mut self, url: impl Into<String>) -> Self {
        self.storage_base_url = url.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_remote_config_key(mut self, key: impl Into<String>) -> Self {
        self.remote_config_key = key.into();
        self
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}
