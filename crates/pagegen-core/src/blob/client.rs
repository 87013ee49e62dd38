//! HTTP client for the blob store service

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{BlobError, BlobResult};
use super::size::check_size;
use crate::config::ClientSettings;
use crate::logging::SharedLogger;

/// Where a published page can be fetched from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPage {
    /// Generated key (UUID v4)
    pub key: String,
    /// `{base}/pages/{key}`
    pub url: String,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    key: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

#[derive(Deserialize)]
struct ValueResponse {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Client for `POST /api/storage`, `GET /pages/{key}` and `GET /api/storage?key=`
#[derive(Clone)]
pub struct BlobStoreClient {
    http: reqwest::Client,
    base_url: String,
    logger: SharedLogger,
}

impl BlobStoreClient {
    pub fn new(base_url: impl Into<String>, logger: SharedLogger) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, logger)
    }

    /// Reuse an existing connection pool
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>, logger: SharedLogger) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url, logger }
    }

    pub fn from_settings(settings: &ClientSettings, logger: SharedLogger) -> Self {
        Self::new(settings.storage_base_url.clone(), logger)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public URL of a published page
    pub fn page_url(&self, key: &str) -> String {
        format!("{}/pages/{}", self.base_url, key)
    }

    /// Publish generated content under a fresh key
    ///
    /// Rejects content above the advisory ceiling before any network I/O.
    pub async fn publish(&self, html: &str, title: Option<&str>) -> BlobResult<PublishedPage> {
        let size = check_size(html);
        if !size.within_limit {
            self.logger.warn(&format!(
                "[BlobStoreClient] refusing to publish {} bytes (limit {})",
                size.size, size.max_size
            ));
            return Err(BlobError::PayloadTooLarge {
                size: size.size,
                max_size: size.max_size,
            });
        }

        let key = Uuid::new_v4().to_string();
        self.put(&key, html, title).await?;

        self.logger.info(&format!("[BlobStoreClient] published page {}", key));
        Ok(PublishedPage {
            url: self.page_url(&key),
            key,
        })
    }

    /// Write `content` under `key` without the size check
    ///
    /// Overwrites whatever was stored under the same key.
    pub async fn put(&self, key: &str, content: &str, title: Option<&str>) -> BlobResult<()> {
        self.logger.debug(&format!(
            "[BlobStoreClient] put key={} bytes={}",
            key,
            content.len()
        ));

        let response = self
            .http
            .post(format!("{}/api/storage", self.base_url))
            .json(&PutRequest { key, html: content, title })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = error_message(response).await;
        if status == StatusCode::BAD_REQUEST {
            return Err(BlobError::InvalidRequest(message));
        }
        Err(BlobError::status(status.as_u16(), message))
    }

    /// Fetch the raw content of a published page
    pub async fn fetch_page(&self, key: &str) -> BlobResult<String> {
        let response = self.http.get(self.page_url(key)).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.text().await?),
            StatusCode::NOT_FOUND => Err(BlobError::NotFound(key.to_string())),
            status => {
                let message = error_message(response).await;
                Err(BlobError::status(status.as_u16(), message))
            }
        }
    }

    /// Read a stored value through the JSON read path
    ///
    /// A missing key is `Ok(None)`, not an error.
    pub async fn fetch_value(&self, key: &str) -> BlobResult<Option<String>> {
        let response = self
            .http
            .get(format!("{}/api/storage", self.base_url))
            .query(&[("key", key)])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                self.logger.debug(&format!("[BlobStoreClient] no value under key {}", key));
                Ok(None)
            }
            status if status.is_success() => {
                let body = response.bytes().await?;
                let parsed: ValueResponse = serde_json::from_slice(&body)?;
                Ok(parsed.value.filter(|v| !v.is_empty()))
            }
            status => {
                let message = error_message(response).await;
                Err(BlobError::status(status.as_u16(), message))
            }
        }
    }
}

impl std::fmt::Debug for BlobStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStoreClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Prefer the service's `{error}` field, fall back to the raw body
async fn error_message(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or(text)
}
