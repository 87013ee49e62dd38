//! Completion error taxonomy

use thiserror::Error;

/// Why a completion session failed
///
/// `ProtocolParseError` never terminates a session: malformed frames are
/// logged and skipped. Every other variant is delivered at most once as the
/// session's terminal `StreamEvent::Failed`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// No complete local or remote configuration is available
    #[error("model configuration is incomplete, configure an endpoint, API key and model first")]
    ConfigurationMissing,

    /// Upstream answered 401
    #[error("API key was rejected, check the configuration")]
    AuthenticationError,

    /// Upstream answered 429
    #[error("too many requests, try again later")]
    RateLimited,

    /// Upstream answered 5xx
    #[error("upstream server error ({status}), try again later")]
    UpstreamError { status: u16 },

    /// Any other non-success handshake status
    #[error("request failed: {status} {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// Connection failure or broken stream
    #[error("network error: {0}")]
    TransportError(String),

    /// A frame could not be parsed
    #[error("malformed stream frame: {0}")]
    ProtocolParseError(String),
}

impl CompletionError {
    /// Map a non-success handshake status to its error
    ///
    /// Returns `None` for 2xx. `body` is only kept for statuses without a
    /// dedicated variant.
    pub fn from_status(status: u16, body: impl Into<String>) -> Option<Self> {
        match status {
            200..=299 => None,
            401 => Some(Self::AuthenticationError),
            429 => Some(Self::RateLimited),
            500..=599 => Some(Self::UpstreamError { status }),
            _ => Some(Self::UnexpectedStatus {
                status,
                body: body.into(),
            }),
        }
    }

    /// Whether the handshake body is part of the error for this status
    pub(crate) fn status_needs_body(status: u16) -> bool {
        !matches!(status, 200..=299 | 401 | 429 | 500..=599)
    }

    pub fn transport(message: impl std::fmt::Display) -> Self {
        Self::TransportError(message.to_string())
    }
}

pub type CompletionResult<T> = Result<T, CompletionError>;
