//! Secret store trait and errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("secret store is read-only")]
    ReadOnly,

    #[error("secret store not available: {0}")]
    NotAvailable(String),

    #[error("secret store error: {0}")]
    Other(String),
}

pub type SecretStoreResult<T> = Result<T, SecretStoreError>;

/// Where deployment secrets (the config cipher key) come from
///
/// # Example
///
/// ```
/// use pagegen_core::secrets::{SecretStore, EnvSecretStore, CONFIG_KEY_SECRET};
///
/// let store = EnvSecretStore::new();
/// // checks PAGEGEN_CONFIG_KEY, then VITE_RC4_KEY
/// let _key = store.get(CONFIG_KEY_SECRET);
/// ```
pub trait SecretStore: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    /// Look up a secret by logical name
    fn get(&self, key: &str) -> Option<String>;

    /// Store a secret; `Err(SecretStoreError::ReadOnly)` for read-only stores
    fn store(&self, key: &str, value: &str) -> SecretStoreResult<()>;

    fn delete(&self, key: &str) -> SecretStoreResult<()>;

    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Name of the store that would answer `get(key)`, for diagnostics
    fn source_of(&self, key: &str) -> Option<&str> {
        self.has(key).then(|| self.name())
    }
}
