//! File-based configuration provider (YAML)
//!
//! Stores the user's model configuration at `<config_dir>/pagegen/config.yaml`.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::traits::{ConfigResult, LocalConfigSource};
use crate::types::EffectiveConfig;

/// File-based configuration provider
///
/// The file holds the three fields under their stored names:
///
/// ```yaml
/// apiUrl: https://api.openai.com/v1
/// apiKey: sk-...
/// modelName: gpt-4o
/// ```
///
/// # Example
///
/// ```no_run
/// use pagegen_core::config::FileConfigProvider;
///
/// let user_config = FileConfigProvider::user();
/// println!("{}", user_config.path().display());
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    /// Create a provider for a specific path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// User-level config (`~/.config/pagegen/config.yaml` on Linux)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        Self::new(config_dir.join("pagegen").join("config.yaml"))
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the config file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("exists", &self.exists())
            .finish()
    }
}

#[async_trait]
impl LocalConfigSource for FileConfigProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> ConfigResult<Option<EffectiveConfig>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_yaml::from_str(&content)?))
    }

    async fn save(&self, config: &EffectiveConfig) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_yaml::to_string(config)?)?;
        Ok(())
    }

    async fn clear(&self) -> ConfigResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_config_provider() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("nested").join("config.yaml"));

        assert!(!provider.exists());
        assert!(provider.load().await.unwrap().is_none());

        let cfg = EffectiveConfig::new("https://api.example.com/v1", "sk-1", "gpt-4o");
        provider.save(&cfg).await.unwrap();

        assert!(provider.exists());
        assert_eq!(provider.load().await.unwrap(), Some(cfg));
        assert!(provider.has_config().await);
    }

    #[tokio::test]
    async fn test_yaml_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let provider = FileConfigProvider::new(&path);

        provider
            .save(&EffectiveConfig::new("https://api.example.com/v1", "sk-1", "gpt-4o"))
            .await
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("apiUrl: https://api.example.com/v1"));
        assert!(content.contains("modelName: gpt-4o"));
    }

    #[tokio::test]
    async fn test_reads_fresh_each_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let provider = FileConfigProvider::new(&path);

        fs::write(&path, "apiUrl: https://a\napiKey: k1\nmodelName: m\n").unwrap();
        assert_eq!(provider.load().await.unwrap().unwrap().credential, "k1");

        fs::write(&path, "apiUrl: https://a\napiKey: k2\nmodelName: m\n").unwrap();
        assert_eq!(provider.load().await.unwrap().unwrap().credential, "k2");
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("config.yaml"));
        provider.clear().await.unwrap();

        provider.save(&EffectiveConfig::new("https://a", "k", "m")).await.unwrap();
        provider.clear().await.unwrap();
        assert!(!provider.exists());
    }

    #[tokio::test]
    async fn test_malformed_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "apiUrl: [unterminated").unwrap();

        let provider = FileConfigProvider::new(&path);
        assert!(matches!(provider.load().await, Err(ConfigError::Yaml(_))));
    }
}
