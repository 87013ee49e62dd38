//! Parsing of streamed chat-completion frames

use serde::Deserialize;

use super::error::{CompletionError, CompletionResult};
use crate::types::StreamEvent;

/// Data payload marking the logical end of the stream
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    // Some OpenAI-compatible gateways name the trace `reasoning`.
    #[serde(default)]
    reasoning: Option<String>,
}

/// One parsed data line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The `[DONE]` sentinel
    Sentinel,
    /// A JSON chunk
    Chunk(ChunkFrame),
}

/// The parts of a chunk the client acts on
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkFrame {
    pub reasoning: Option<String>,
    pub content: Option<String>,
    /// `choices[0].finish_reason` was set
    pub finished: bool,
}

impl ChunkFrame {
    /// Deltas in delivery order: reasoning before content
    pub fn deltas(&self) -> Vec<StreamEvent> {
        let mut events = Vec::with_capacity(2);
        if let Some(reasoning) = &self.reasoning {
            events.push(StreamEvent::reasoning(reasoning.clone()));
        }
        if let Some(content) = &self.content {
            events.push(StreamEvent::content(content.clone()));
        }
        events
    }
}

/// Parse the data of one event frame
///
/// Empty deltas are dropped here so callers never see zero-length fragments.
pub fn parse_frame(data: &str) -> CompletionResult<Frame> {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return Ok(Frame::Sentinel);
    }

    let payload: ChunkPayload = serde_json::from_str(data)
        .map_err(|e| CompletionError::ProtocolParseError(format!("{}: {}", e, data)))?;

    let Some(choice) = payload.choices.into_iter().next() else {
        return Ok(Frame::Chunk(ChunkFrame::default()));
    };

    let delta = choice.delta.unwrap_or_default();
    let reasoning = delta
        .reasoning_content
        .filter(|s| !s.is_empty())
        .or(delta.reasoning.filter(|s| !s.is_empty()));

    Ok(Frame::Chunk(ChunkFrame {
        reasoning,
        content: delta.content.filter(|s| !s.is_empty()),
        finished: choice.finish_reason.is_some_and(|r| !r.is_empty()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(data: &str) -> ChunkFrame {
        match parse_frame(data).unwrap() {
            Frame::Chunk(frame) => frame,
            Frame::Sentinel => panic!("unexpected sentinel"),
        }
    }

    #[test]
    fn test_sentinel() {
        assert_eq!(parse_frame("[DONE]").unwrap(), Frame::Sentinel);
        assert_eq!(parse_frame(" [DONE]\n").unwrap(), Frame::Sentinel);
    }

    #[test]
    fn test_content_delta() {
        let frame = chunk(r#"{"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}"#);
        assert_eq!(frame.content.as_deref(), Some("Hello"));
        assert_eq!(frame.reasoning, None);
        assert!(!frame.finished);
    }

    #[test]
    fn test_reasoning_precedes_content() {
        let frame = chunk(r#"{"choices":[{"delta":{"content":"A","reasoning_content":"R"}}]}"#);
        assert_eq!(frame.deltas(), vec![StreamEvent::reasoning("R"), StreamEvent::content("A")]);
    }

    #[test]
    fn test_reasoning_alias() {
        let frame = chunk(r#"{"choices":[{"delta":{"reasoning":"thinking"}}]}"#);
        assert_eq!(frame.reasoning.as_deref(), Some("thinking"));
    }

    #[test]
    fn test_empty_and_null_fields_are_dropped() {
        let frame = chunk(r#"{"choices":[{"delta":{"content":"","reasoning_content":null,"role":"assistant"}}]}"#);
        assert!(frame.deltas().is_empty());
    }

    #[test]
    fn test_finish_reason() {
        let frame = chunk(r#"{"choices":[{"delta":{"content":"end"},"finish_reason":"stop"}]}"#);
        assert!(frame.finished);
        assert_eq!(frame.deltas(), vec![StreamEvent::content("end")]);
    }

    #[test]
    fn test_usage_only_chunk() {
        let frame = chunk(r#"{"choices":[],"usage":{"total_tokens":12}}"#);
        assert_eq!(frame, ChunkFrame::default());
    }

    #[test]
    fn test_malformed_frame() {
        let err = parse_frame("{not json").unwrap_err();
        assert!(matches!(err, CompletionError::ProtocolParseError(_)));
    }
}
