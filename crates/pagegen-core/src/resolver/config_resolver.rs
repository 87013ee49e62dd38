//! Layered configuration resolution with a cached remote fallback
//!
//! Resolution order:
//! 1. Local configuration, re-read on every call, used when complete
//! 2. Cached remote configuration (`Available` / `Unavailable`)
//! 3. Fetch + decrypt + parse of the published blob, cached atomically
//!
//! Cache transitions only move forward (`Unresolved -> Available | Unavailable`).
//! [`ConfigResolver::invalidate`] is the single way back to `Unresolved`, and it
//! bumps a generation counter so a fetch that started before the invalidation
//! cannot commit its result afterwards.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::Mutex;

use super::remote::RemoteConfigSource;
use crate::blob::BlobError;
use crate::cipher::{decrypt_from_hex, CipherError};
use crate::config::{ClientSettings, LocalConfigSource, DEFAULT_REMOTE_CONFIG_KEY};
use crate::logging::SharedLogger;
use crate::secrets::{ChainSecretStore, SecretStore, SecretStoreResult, CONFIG_KEY_SECRET};
use crate::types::EffectiveConfig;

/// Whether the remote fallback configuration can be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Availability {
    /// Not attempted since startup or the last invalidation
    #[default]
    Unresolved,
    /// Fetched, decrypted and complete
    Available,
    /// Missing or unusable; not retried until invalidated
    Unavailable,
}

/// Snapshot of the remote configuration cache
#[derive(Debug, Clone, Default)]
pub struct CachedRemoteConfig {
    value: Option<EffectiveConfig>,
    availability: Availability,
    generation: u64,
}

impl CachedRemoteConfig {
    pub fn value(&self) -> Option<&EffectiveConfig> {
        self.value.as_ref()
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    /// The cached answer, or `None` while unresolved
    fn resolved(&self) -> Option<Option<EffectiveConfig>> {
        match self.availability {
            Availability::Unresolved => None,
            Availability::Available => Some(self.value.clone()),
            Availability::Unavailable => Some(None),
        }
    }
}

/// Reasons the remote configuration was rejected; logged, never returned
#[derive(Debug, Error)]
enum RemoteConfigError {
    #[error("decryption key is not configured")]
    MissingKey,
    #[error("no configuration is published")]
    NotPublished,
    #[error("fetch failed: {0}")]
    Fetch(#[from] BlobError),
    #[error("decryption failed: {0}")]
    Decrypt(#[from] CipherError),
    #[error("decrypted configuration is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
    #[error("decrypted configuration is missing required fields")]
    Incomplete,
}

/// Resolves the endpoint/credential/model triple used for completions
///
/// Construct one per process (or per credential scope) and share it behind
/// an `Arc`; the remote cache lives inside the instance.
pub struct ConfigResolver {
    local: Arc<dyn LocalConfigSource>,
    remote: Arc<dyn RemoteConfigSource>,
    secrets: Arc<dyn SecretStore>,
    remote_key: String,
    logger: SharedLogger,
    cache: RwLock<CachedRemoteConfig>,
    // Serialises remote fetches so concurrent callers share one attempt.
    fetch_gate: Mutex<()>,
}

impl ConfigResolver {
    pub fn new(
        local: Arc<dyn LocalConfigSource>,
        remote: Arc<dyn RemoteConfigSource>,
        secrets: Arc<dyn SecretStore>,
        logger: SharedLogger,
    ) -> Self {
        Self {
            local,
            remote,
            secrets,
            remote_key: DEFAULT_REMOTE_CONFIG_KEY.to_string(),
            logger,
            cache: RwLock::new(CachedRemoteConfig::default()),
            fetch_gate: Mutex::new(()),
        }
    }

    /// Standard wiring for a host process
    ///
    /// The cipher key is looked up in memory first (see
    /// [`ConfigResolver::set_config_key`]) and then in the environment. The
    /// fallback is read from `settings.remote_config_key`.
    pub fn from_settings(
        local: Arc<dyn LocalConfigSource>,
        remote: Arc<dyn RemoteConfigSource>,
        settings: &ClientSettings,
        logger: SharedLogger,
    ) -> Self {
        Self::new(local, remote, Arc::new(ChainSecretStore::memory_then_env()), logger)
            .with_remote_key(settings.remote_config_key.clone())
    }

    /// Read the fallback from a different blob key
    pub fn with_remote_key(mut self, key: impl Into<String>) -> Self {
        self.remote_key = key.into();
        self
    }

    pub fn remote_key(&self) -> &str {
        &self.remote_key
    }

    /// The configuration to use for the next request, if any
    ///
    /// `None` is an expected outcome: neither a complete local configuration
    /// nor a usable remote fallback exists.
    pub async fn resolve_effective_config(&self) -> Option<EffectiveConfig> {
        if let Some(local) = self.local_config().await {
            self.logger
                .debug(&format!("[ConfigResolver] using local configuration ({})", self.local.name()));
            return Some(local);
        }
        self.resolve_remote().await
    }

    /// The remote fallback alone, fetching it if still unresolved
    pub async fn resolve_remote(&self) -> Option<EffectiveConfig> {
        let cached = self.cache.read().resolved();
        if let Some(cached) = cached {
            return cached;
        }

        let _gate = self.fetch_gate.lock().await;

        // Another caller may have resolved it while we waited.
        let generation = {
            let cache = self.cache.read();
            if let Some(cached) = cache.resolved() {
                return cached;
            }
            cache.generation
        };

        let outcome = self.fetch_remote().await;
        self.commit(generation, outcome)
    }

    /// Forget the cached remote configuration, e.g. after credential rotation
    pub fn invalidate(&self) {
        let mut cache = self.cache.write();
        *cache = CachedRemoteConfig {
            generation: cache.generation.wrapping_add(1),
            ..CachedRemoteConfig::default()
        };
        self.logger.info("[ConfigResolver] remote configuration cache invalidated");
    }

    /// Supply the cipher key at runtime and drop any cached remote answer
    pub fn set_config_key(&self, key: &str) -> SecretStoreResult<()> {
        self.secrets.store(CONFIG_KEY_SECRET, key)?;
        self.invalidate();
        Ok(())
    }

    /// Forget a runtime cipher key; other sources in the store still apply
    pub fn clear_config_key(&self) -> SecretStoreResult<()> {
        self.secrets.delete(CONFIG_KEY_SECRET)?;
        self.invalidate();
        Ok(())
    }

    /// Current remote availability, without any I/O
    pub fn remote_availability(&self) -> Availability {
        self.cache.read().availability
    }

    /// Current cache contents
    pub fn cached_remote(&self) -> CachedRemoteConfig {
        self.cache.read().clone()
    }

    /// Whether the remote fallback is usable, resolving it if needed
    pub async fn is_remote_available(&self) -> bool {
        self.resolve_remote().await;
        self.remote_availability() == Availability::Available
    }

    /// Whether requests would fall back to the remote configuration
    pub async fn is_using_remote(&self) -> bool {
        self.local_config().await.is_none()
    }

    async fn local_config(&self) -> Option<EffectiveConfig> {
        match self.local.load().await {
            Ok(Some(config)) => config.into_complete(),
            Ok(None) => None,
            Err(e) => {
                self.logger.warn(&format!(
                    "[ConfigResolver] ignoring unreadable local configuration ({}): {}",
                    self.local.name(),
                    e
                ));
                None
            }
        }
    }

    async fn fetch_remote(&self) -> Result<EffectiveConfig, RemoteConfigError> {
        let key = self.secrets.get(CONFIG_KEY_SECRET).ok_or(RemoteConfigError::MissingKey)?;
        self.logger.debug(&format!(
            "[ConfigResolver] cipher key supplied by {}",
            self.secrets.source_of(CONFIG_KEY_SECRET).unwrap_or(self.secrets.name())
        ));

        let sealed = self
            .remote
            .fetch_value(&self.remote_key)
            .await?
            .ok_or(RemoteConfigError::NotPublished)?;

        let plaintext = decrypt_from_hex(&sealed, &key)?;
        let config: EffectiveConfig = serde_json::from_str(&plaintext)?;
        config.into_complete().ok_or(RemoteConfigError::Incomplete)
    }

    fn commit(
        &self,
        generation: u64,
        outcome: Result<EffectiveConfig, RemoteConfigError>,
    ) -> Option<EffectiveConfig> {
        let mut cache = self.cache.write();
        let current = cache.generation == generation && cache.availability == Availability::Unresolved;

        match outcome {
            Ok(config) => {
                if current {
                    cache.value = Some(config.clone());
                    cache.availability = Availability::Available;
                    self.logger.info(&format!(
                        "[ConfigResolver] remote configuration available (model={})",
                        config.model_name
                    ));
                }
                Some(config)
            }
            Err(e) => {
                if current {
                    cache.value = None;
                    cache.availability = Availability::Unavailable;
                }
                match e {
                    RemoteConfigError::NotPublished => {
                        self.logger.info("[ConfigResolver] no remote configuration published")
                    }
                    other => self
                        .logger
                        .warn(&format!("[ConfigResolver] remote configuration unavailable: {}", other)),
                }
                None
            }
        }
    }
}

impl std::fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("local", &self.local.name())
            .field("remote_key", &self.remote_key)
            .field("availability", &self.remote_availability())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BlobResult;
    use crate::cipher::encrypt_to_hex;
    use crate::config::{FileConfigProvider, MemoryConfigProvider};
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;
    use crate::test_support::RecordingLogger;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const KEY: &str = "deploy-key";

    #[derive(Clone)]
    enum Reply {
        Value(String),
        Missing,
        Unreachable,
    }

    struct FakeRemote {
        reply: SyncMutex<Reply>,
        delay: Duration,
        calls: AtomicUsize,
        keys: SyncMutex<Vec<String>>,
    }

    impl FakeRemote {
        fn new(reply: Reply) -> Arc<Self> {
            Self::delayed(reply, Duration::ZERO)
        }

        fn delayed(reply: Reply, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                reply: SyncMutex::new(reply),
                delay,
                calls: AtomicUsize::new(0),
                keys: SyncMutex::new(Vec::new()),
            })
        }

        fn sealed(config: &EffectiveConfig) -> Reply {
            Reply::Value(encrypt_to_hex(&serde_json::to_string(config).unwrap(), KEY).unwrap())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn keys(&self) -> Vec<String> {
            self.keys.lock().clone()
        }
    }

    #[async_trait]
    impl RemoteConfigSource for FakeRemote {
        async fn fetch_value(&self, key: &str) -> BlobResult<Option<String>> {
            self.keys.lock().push(key.to_string());
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let reply = self.reply.lock().clone();
            match reply {
                Reply::Value(v) => Ok(Some(v)),
                Reply::Missing => Ok(None),
                Reply::Unreachable => Err(BlobError::status(502, "bad gateway")),
            }
        }
    }

    fn official() -> EffectiveConfig {
        EffectiveConfig::new("https://official.example.com/v1", "sk-official", "official-model")
    }

    fn user() -> EffectiveConfig {
        EffectiveConfig::new("https://user.example.com/v1", "sk-user", "user-model")
    }

    fn resolver(local: Option<EffectiveConfig>, remote: Arc<FakeRemote>) -> ConfigResolver {
        let provider = match local {
            Some(config) => MemoryConfigProvider::with_config(config),
            None => MemoryConfigProvider::new(),
        };
        ConfigResolver::new(
            Arc::new(provider),
            remote,
            Arc::new(MemorySecretStore::with_secret(CONFIG_KEY_SECRET, KEY)),
            Arc::new(NoOpLogger),
        )
    }

    #[tokio::test]
    async fn test_local_config_takes_precedence() {
        let remote = FakeRemote::new(FakeRemote::sealed(&official()));
        let resolver = resolver(Some(user()), remote.clone());

        assert_eq!(resolver.resolve_effective_config().await, Some(user()));
        assert_eq!(remote.calls(), 0);
        assert_eq!(resolver.remote_availability(), Availability::Unresolved);
        assert!(!resolver.is_using_remote().await);
    }

    #[tokio::test]
    async fn test_local_config_wins_even_when_remote_unavailable() {
        let resolver = resolver(Some(user()), FakeRemote::new(Reply::Missing));
        resolver.resolve_remote().await;
        assert_eq!(resolver.remote_availability(), Availability::Unavailable);

        assert_eq!(resolver.resolve_effective_config().await, Some(user()));
    }

    #[tokio::test]
    async fn test_local_config_is_reread_every_time() {
        let local = Arc::new(MemoryConfigProvider::with_config(user()));
        let resolver = ConfigResolver::new(
            local.clone(),
            FakeRemote::new(FakeRemote::sealed(&official())),
            Arc::new(MemorySecretStore::with_secret(CONFIG_KEY_SECRET, KEY)),
            Arc::new(NoOpLogger),
        );
        assert_eq!(resolver.resolve_effective_config().await, Some(user()));

        local.set(None);
        assert_eq!(resolver.resolve_effective_config().await, Some(official()));

        let edited = EffectiveConfig::new("https://edited.example.com", "sk-2", "m2");
        local.set(Some(edited.clone()));
        assert_eq!(resolver.resolve_effective_config().await, Some(edited));
    }

    #[tokio::test]
    async fn test_incomplete_local_config_falls_back_to_remote() {
        let remote = FakeRemote::new(FakeRemote::sealed(&official()));
        let partial = EffectiveConfig::new("https://user.example.com/v1", "", "user-model");
        let resolver = resolver(Some(partial), remote.clone());

        assert_eq!(resolver.resolve_effective_config().await, Some(official()));
        assert_eq!(resolver.remote_availability(), Availability::Available);
        assert!(resolver.is_using_remote().await);
    }

    #[tokio::test]
    async fn test_remote_config_is_cached() {
        let remote = FakeRemote::new(FakeRemote::sealed(&official()));
        let resolver = resolver(None, remote.clone());

        assert_eq!(resolver.resolve_effective_config().await, Some(official()));
        assert_eq!(resolver.resolve_effective_config().await, Some(official()));
        assert_eq!(remote.calls(), 1);
        assert_eq!(remote.keys(), vec!["config".to_string()]);
        assert_eq!(resolver.cached_remote().value(), Some(&official()));
    }

    #[tokio::test]
    async fn test_remote_not_found_marks_unavailable() {
        let remote = FakeRemote::new(Reply::Missing);
        let resolver = resolver(None, remote.clone());

        assert_eq!(resolver.resolve_effective_config().await, None);
        assert_eq!(resolver.remote_availability(), Availability::Unavailable);

        // Not retried within the same resolver lifetime
        assert_eq!(resolver.resolve_effective_config().await, None);
        assert_eq!(remote.calls(), 1);
        assert!(!resolver.is_remote_available().await);
    }

    #[tokio::test]
    async fn test_fetch_failure_marks_unavailable() {
        let resolver = resolver(None, FakeRemote::new(Reply::Unreachable));
        assert_eq!(resolver.resolve_effective_config().await, None);
        assert_eq!(resolver.remote_availability(), Availability::Unavailable);
    }

    #[tokio::test]
    async fn test_missing_decryption_key_skips_fetch() {
        let remote = FakeRemote::new(FakeRemote::sealed(&official()));
        let resolver = ConfigResolver::new(
            Arc::new(MemoryConfigProvider::new()),
            remote.clone(),
            Arc::new(MemorySecretStore::new()),
            Arc::new(NoOpLogger),
        );

        assert_eq!(resolver.resolve_effective_config().await, None);
        assert_eq!(resolver.remote_availability(), Availability::Unavailable);
        assert_eq!(remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_ciphertext_marks_unavailable() {
        let logger = Arc::new(RecordingLogger::default());
        let resolver = ConfigResolver::new(
            Arc::new(MemoryConfigProvider::new()),
            FakeRemote::new(Reply::Value("zz-not-hex".to_string())),
            Arc::new(MemorySecretStore::with_secret(CONFIG_KEY_SECRET, KEY)),
            logger.clone(),
        );

        assert_eq!(resolver.resolve_effective_config().await, None);
        assert_eq!(resolver.remote_availability(), Availability::Unavailable);
        assert!(logger.contains("decryption failed"));
    }

    #[tokio::test]
    async fn test_wrong_key_marks_unavailable() {
        let sealed = encrypt_to_hex(&serde_json::to_string(&official()).unwrap(), "other-key").unwrap();
        let resolver = resolver(None, FakeRemote::new(Reply::Value(sealed)));

        assert_eq!(resolver.resolve_effective_config().await, None);
        assert_eq!(resolver.remote_availability(), Availability::Unavailable);
    }

    #[tokio::test]
    async fn test_incomplete_remote_config_marks_unavailable() {
        let sealed = encrypt_to_hex(r#"{"apiUrl":"https://x","apiKey":"k"}"#, KEY).unwrap();
        let resolver = resolver(None, FakeRemote::new(Reply::Value(sealed)));

        assert_eq!(resolver.resolve_effective_config().await, None);
        assert_eq!(resolver.remote_availability(), Availability::Unavailable);
        assert!(resolver.cached_remote().value().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_allows_refetch() {
        let remote = FakeRemote::new(Reply::Missing);
        let resolver = resolver(None, remote.clone());
        assert_eq!(resolver.resolve_effective_config().await, None);

        *remote.reply.lock() = FakeRemote::sealed(&official());
        assert_eq!(resolver.resolve_effective_config().await, None);

        resolver.invalidate();
        assert_eq!(resolver.remote_availability(), Availability::Unresolved);
        assert_eq!(resolver.resolve_effective_config().await, Some(official()));
        assert_eq!(remote.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_resolutions_share_one_fetch() {
        let remote = FakeRemote::delayed(FakeRemote::sealed(&official()), Duration::from_millis(30));
        let resolver = Arc::new(resolver(None, remote.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                tokio::spawn(async move { resolver.resolve_effective_config().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Some(official()));
        }
        assert_eq!(remote.calls(), 1);
        assert_eq!(resolver.remote_availability(), Availability::Available);
    }

    #[tokio::test]
    async fn test_fetch_started_before_invalidate_is_not_cached() {
        let remote = FakeRemote::delayed(Reply::Missing, Duration::from_millis(50));
        let resolver = Arc::new(resolver(None, remote.clone()));

        let in_flight = {
            let resolver = Arc::clone(&resolver);
            tokio::spawn(async move { resolver.resolve_remote().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        resolver.invalidate();

        assert_eq!(in_flight.await.unwrap(), None);
        assert_eq!(resolver.remote_availability(), Availability::Unresolved);
    }

    #[tokio::test]
    async fn test_unreadable_local_file_falls_back_to_remote() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "apiUrl: [broken").unwrap();

        let resolver = ConfigResolver::new(
            Arc::new(FileConfigProvider::new(&path)),
            FakeRemote::new(FakeRemote::sealed(&official())),
            Arc::new(MemorySecretStore::with_secret(CONFIG_KEY_SECRET, KEY)),
            Arc::new(NoOpLogger),
        );
        assert_eq!(resolver.resolve_effective_config().await, Some(official()));
    }

    #[tokio::test]
    async fn test_from_settings_reads_configured_key() {
        let remote = FakeRemote::new(FakeRemote::sealed(&official()));
        let settings = ClientSettings::default().with_remote_config_key("official-config");
        let resolver = ConfigResolver::from_settings(
            Arc::new(MemoryConfigProvider::new()),
            remote.clone(),
            &settings,
            Arc::new(NoOpLogger),
        );
        assert_eq!(resolver.remote_key(), "official-config");

        resolver.set_config_key(KEY).unwrap();
        assert_eq!(resolver.resolve_effective_config().await, Some(official()));
        assert_eq!(remote.keys(), vec!["official-config".to_string()]);
    }

    #[tokio::test]
    async fn test_set_config_key_invalidates_cache() {
        let remote = FakeRemote::new(FakeRemote::sealed(&official()));
        let resolver = ConfigResolver::new(
            Arc::new(MemoryConfigProvider::new()),
            remote.clone(),
            Arc::new(ChainSecretStore::new(vec![Arc::new(MemorySecretStore::new())])),
            Arc::new(NoOpLogger),
        );

        assert_eq!(resolver.resolve_effective_config().await, None);
        assert_eq!(resolver.remote_availability(), Availability::Unavailable);
        assert_eq!(remote.calls(), 0);

        resolver.set_config_key(KEY).unwrap();
        assert_eq!(resolver.remote_availability(), Availability::Unresolved);
        assert_eq!(resolver.resolve_effective_config().await, Some(official()));

        resolver.clear_config_key().unwrap();
        assert_eq!(resolver.resolve_effective_config().await, None);
        assert_eq!(remote.calls(), 1);
    }
}
