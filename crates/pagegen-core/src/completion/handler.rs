//! Callback surface over a session

use super::error::CompletionError;
use crate::types::StreamEvent;

/// Receives a session's events in order
///
/// Every method has a no-op default. Exactly one of `on_complete`,
/// `on_error` or `on_cancelled` is called per session, last.
pub trait StreamHandler {
    fn on_content(&mut self, _text: &str) {}

    fn on_reasoning(&mut self, _text: &str) {}

    fn on_complete(&mut self) {}

    fn on_error(&mut self, _error: &CompletionError) {}

    fn on_cancelled(&mut self) {}
}

/// Accumulates everything a session delivers
#[derive(Debug, Default, Clone)]
pub struct CollectingHandler {
    pub content: String,
    pub reasoning: String,
    pub events: Vec<StreamEvent>,
}

impl CollectingHandler {
    /// The terminal event, once delivered
    pub fn outcome(&self) -> Option<&StreamEvent> {
        self.events.last().filter(|event| event.is_terminal())
    }

    pub fn error(&self) -> Option<&CompletionError> {
        match self.outcome() {
            Some(StreamEvent::Failed(error)) => Some(error),
            _ => None,
        }
    }
}

impl StreamHandler for CollectingHandler {
    fn on_content(&mut self, text: &str) {
        self.content.push_str(text);
        self.events.push(StreamEvent::content(text));
    }

    fn on_reasoning(&mut self, text: &str) {
        self.reasoning.push_str(text);
        self.events.push(StreamEvent::reasoning(text));
    }

    fn on_complete(&mut self) {
        self.events.push(StreamEvent::Done);
    }

    fn on_error(&mut self, error: &CompletionError) {
        self.events.push(StreamEvent::Failed(error.clone()));
    }

    fn on_cancelled(&mut self) {
        self.events.push(StreamEvent::Cancelled);
    }
}
