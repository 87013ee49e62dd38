//! Pagegen Server
//!
//! Stateless HTTP front for a key/value backend. Publishers store generated
//! pages under keys they generate themselves; browsers fetch them from
//! `/pages/{key}`. The encrypted fallback model configuration lives in the
//! same namespace and is read through `GET /api/storage?key=`.
//!
//! Values are stored as-is: no size limit beyond the transport body cap and
//! no concurrency control beyond the backend's own (last writer wins).

pub mod backend;
pub mod cors;
pub mod error;
pub mod routes;
pub mod settings;

pub use backend::{open_backend, FsBackend, KvBackend, MemoryBackend};
pub use error::{StoreError, StoreResult};
pub use routes::{router, AppState};
pub use settings::{BackendKind, ServerSettings};

use tokio::net::TcpListener;

/// Build the router for `settings` and serve it on `listener` until shutdown
pub async fn serve(listener: TcpListener, settings: &ServerSettings) -> StoreResult<()> {
    let backend = open_backend(settings).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        backend = backend.name(),
        body_limit = settings.body_limit,
        "pagegen-server listening"
    );

    let app = router(AppState::new(backend), settings.body_limit);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pagegen_core::blob::BlobError;
    use pagegen_core::config::MemoryConfigProvider;
    use pagegen_core::{
        encrypt_to_hex, Availability, BlobStoreClient, ClientSettings, ConfigResolver,
        EffectiveConfig, NoOpLogger,
    };

    use super::*;

    async fn spawn_server(settings: ServerSettings) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            serve(listener, &settings).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_publish_and_fetch_through_real_client() {
        let base = spawn_server(ServerSettings::default()).await;
        let client = BlobStoreClient::new(&base, Arc::new(NoOpLogger));

        let page = client.publish("<h1>Otters</h1>", Some("Otters")).await.unwrap();
        assert_eq!(page.url, format!("{}/pages/{}", base, page.key));
        assert_eq!(client.fetch_page(&page.key).await.unwrap(), "<h1>Otters</h1>");

        let missing = client.fetch_page("never-written").await.unwrap_err();
        assert!(matches!(missing, BlobError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_size_ceiling_is_advisory() {
        let base = spawn_server(ServerSettings::default()).await;
        let client = BlobStoreClient::new(&base, Arc::new(NoOpLogger));
        let oversize = "a".repeat(2 * 1024 * 1024);

        let err = client.publish(&oversize, None).await.unwrap_err();
        assert!(matches!(err, BlobError::PayloadTooLarge { .. }));

        client.put("raw", &oversize, None).await.unwrap();
        assert_eq!(client.fetch_page("raw").await.unwrap().len(), oversize.len());
    }

    #[tokio::test]
    async fn test_resolver_reads_encrypted_config_from_server() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = ServerSettings {
            backend: BackendKind::Fs,
            data_dir: dir.path().to_path_buf(),
            ..ServerSettings::default()
        };
        let base = spawn_server(settings).await;
        let blobs = Arc::new(BlobStoreClient::new(&base, Arc::new(NoOpLogger)));

        let published = EffectiveConfig::new("https://llm.example/v1", "sk-shared", "shared-model");
        let plaintext = serde_json::to_string(&published).unwrap();
        let ciphertext = encrypt_to_hex(&plaintext, "deploy-key").unwrap();
        blobs.put("shared-config", &ciphertext, None).await.unwrap();

        let client_settings = ClientSettings::default()
            .with_storage_base_url(base.as_str())
            .with_remote_config_key("shared-config");
        let resolver = ConfigResolver::from_settings(
            Arc::new(MemoryConfigProvider::new()),
            blobs,
            &client_settings,
            Arc::new(NoOpLogger),
        );
        resolver.set_config_key("deploy-key").unwrap();

        assert_eq!(resolver.resolve_effective_config().await, Some(published));
        assert_eq!(resolver.remote_availability(), Availability::Available);
        assert!(resolver.is_using_remote().await);
    }
}
