//! Shared helpers for in-crate tests

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::blob::BlobResult;
use crate::config::MemoryConfigProvider;
use crate::logging::{Logger, NoOpLogger};
use crate::resolver::{ConfigResolver, RemoteConfigSource};
use crate::secrets::MemorySecretStore;
use crate::types::EffectiveConfig;

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_upstream(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing is listening on
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Captures messages so tests can assert on what was logged
#[derive(Debug, Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingLogger {
    pub fn count(&self, level: &str) -> usize {
        self.lines.lock().iter().filter(|(l, _)| *l == level).count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|(_, m)| m.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn debug(&self, message: &str) {
        self.lines.lock().push(("debug", message.to_string()));
    }
    fn info(&self, message: &str) {
        self.lines.lock().push(("info", message.to_string()));
    }
    fn warn(&self, message: &str) {
        self.lines.lock().push(("warn", message.to_string()));
    }
    fn error(&self, message: &str) {
        self.lines.lock().push(("error", message.to_string()));
    }
}

/// Remote source with nothing published
pub struct NoRemoteConfig;

#[async_trait]
impl RemoteConfigSource for NoRemoteConfig {
    async fn fetch_value(&self, _key: &str) -> BlobResult<Option<String>> {
        Ok(None)
    }
}

/// Resolver that only knows `local`
pub fn local_resolver(local: Option<EffectiveConfig>) -> Arc<ConfigResolver> {
    let provider = MemoryConfigProvider::new();
    provider.set(local);
    Arc::new(ConfigResolver::new(
        Arc::new(provider),
        Arc::new(NoRemoteConfig),
        Arc::new(MemorySecretStore::new()),
        Arc::new(NoOpLogger),
    ))
}
