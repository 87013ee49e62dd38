//! Source of the encrypted fallback configuration

use async_trait::async_trait;

use crate::blob::{BlobResult, BlobStoreClient};

/// Read path for published configuration values
///
/// `Ok(None)` means nothing is published under the key, a normal outcome.
#[async_trait]
pub trait RemoteConfigSource: Send + Sync {
    async fn fetch_value(&self, key: &str) -> BlobResult<Option<String>>;
}

#[async_trait]
impl RemoteConfigSource for BlobStoreClient {
    async fn fetch_value(&self, key: &str) -> BlobResult<Option<String>> {
        BlobStoreClient::fetch_value(self, key).await
    }
}
