//! Events delivered by a streaming completion session

use crate::completion::CompletionError;

/// One observable event of a completion session, in delivery order
///
/// `Done`, `Failed` and `Cancelled` are terminal: exactly one of them is
/// delivered per session and nothing follows it.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Fragment of visible output
    Content(String),
    /// Fragment of the model's reasoning trace
    Reasoning(String),
    /// Logical end of stream
    Done,
    /// The session failed; carries the structured cause
    Failed(CompletionError),
    /// The session was cancelled by the caller
    Cancelled,
}

impl StreamEvent {
    /// Create a content delta
    pub fn content(text: impl Into<String>) -> Self {
        StreamEvent::Content(text.into())
    }

    /// Create a reasoning delta
    pub fn reasoning(text: impl Into<String>) -> Self {
        StreamEvent::Reasoning(text.into())
    }

    /// Whether no further events follow this one
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Failed(_) | StreamEvent::Cancelled)
    }

    /// Whether this is a content or reasoning fragment
    pub fn is_delta(&self) -> bool {
        matches!(self, StreamEvent::Content(_) | StreamEvent::Reasoning(_))
    }

    /// Get the text if this is a content delta
    pub fn as_content(&self) -> Option<&str> {
        match self {
            StreamEvent::Content(text) => Some(text),
            _ => None,
        }
    }

    /// Get the text if this is a reasoning delta
    pub fn as_reasoning(&self) -> Option<&str> {
        match self {
            StreamEvent::Reasoning(text) => Some(text),
            _ => None,
        }
    }
}
