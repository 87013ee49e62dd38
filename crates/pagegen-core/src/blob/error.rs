//! Blob client error types

use thiserror::Error;

/// Errors returned by blob store operations
#[derive(Error, Debug)]
pub enum BlobError {
    /// The store rejected the request (missing key or content)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No content stored under this key
    #[error("no content stored under key {0}")]
    NotFound(String),

    /// Content exceeds the advisory publish ceiling
    #[error("content is {size} bytes, the publish limit is {max_size} bytes")]
    PayloadTooLarge { size: usize, max_size: usize },

    /// Any other non-success status from the store
    #[error("storage service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Network/HTTP error
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BlobError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound(_))
    }
}

pub type BlobResult<T> = Result<T, BlobError>;
