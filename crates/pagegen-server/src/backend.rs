//! Key/value backends behind the storage routes
//!
//! Both backends are last-writer-wins and store values of any size.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::settings::{BackendKind, ServerSettings};

#[async_trait]
pub trait KvBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Write `value` under `key`, replacing any previous value
    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;
}

/// Open the backend selected in `settings`
pub async fn open_backend(settings: &ServerSettings) -> StoreResult<Arc<dyn KvBackend>> {
    match settings.backend {
        BackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),
        BackendKind::Fs => Ok(Arc::new(FsBackend::open(&settings.data_dir).await?)),
    }
}

/// Process-local map; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// One file per key under a root directory
///
/// File names are the hex SHA-256 of the key: fixed length and safe for any
/// key. Writes go to a temporary file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    /// Use `root`, creating it if needed
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        tracing::info!(root = %root.display(), "file backend ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_name(key: &str) -> String {
        hex::encode(Sha256::digest(key.as_bytes()))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(Self::file_name(key))
    }
}

#[async_trait]
impl KvBackend for FsBackend {
    fn name(&self) -> &str {
        "fs"
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let target = self.path_for(key);
        let temp = self.root.join(format!(
            ".{}.{}.tmp",
            Self::file_name(key),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        tokio::fs::write(&temp, value).await?;
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
