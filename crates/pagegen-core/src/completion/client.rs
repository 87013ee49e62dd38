//! Streaming chat completion client

use std::sync::Arc;

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use serde::Serialize;
use tokio::sync::mpsc;

use super::error::CompletionError;
use super::frame::{parse_frame, Frame};
use super::session::{Session, SessionShared, SessionState};
use crate::config::{ClientSettings, DEFAULT_TEMPERATURE};
use crate::logging::SharedLogger;
use crate::resolver::ConfigResolver;
use crate::types::{ChatMessage, EffectiveConfig, StreamEvent};

/// Events buffered between the network task and the consumer
const EVENT_BUFFER: usize = 2;

/// Body of a `chat/completions` request
#[derive(Debug, Serialize)]
pub(crate) struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Client for OpenAI-compatible streaming chat completions
///
/// Each [`send`](Self::send) resolves the effective configuration afresh,
/// so edits to the local configuration apply to the next request.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use futures::StreamExt;
/// use pagegen_core::{ChatMessage, StreamEvent, StreamingCompletionClient, ConfigResolver};
/// use pagegen_core::logging::TracingLogger;
///
/// # async fn demo(resolver: Arc<ConfigResolver>) {
/// let client = StreamingCompletionClient::new(resolver, Arc::new(TracingLogger::new()));
/// let mut session = client.send(vec![ChatMessage::user("Build a landing page")]);
/// while let Some(event) = session.next().await {
///     if let StreamEvent::Content(text) = event {
///         print!("{}", text);
///     }
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct StreamingCompletionClient {
    pub(crate) http: reqwest::Client,
    resolver: Arc<ConfigResolver>,
    temperature: f32,
    pub(crate) logger: SharedLogger,
}

impl StreamingCompletionClient {
    pub fn new(resolver: Arc<ConfigResolver>, logger: SharedLogger) -> Self {
        Self {
            http: reqwest::Client::new(),
            resolver,
            temperature: DEFAULT_TEMPERATURE,
            logger,
        }
    }

    pub fn from_settings(
        resolver: Arc<ConfigResolver>,
        settings: &ClientSettings,
        logger: SharedLogger,
    ) -> Self {
        Self::new(resolver, logger).with_temperature(settings.temperature)
    }

    /// Use a preconfigured HTTP client (proxies, timeouts)
    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn resolver(&self) -> &Arc<ConfigResolver> {
        &self.resolver
    }

    /// Open a streaming completion session for `messages`
    ///
    /// Returns immediately; configuration resolution and the handshake run
    /// in a background task. Must be called within a tokio runtime.
    pub fn send(&self, messages: Vec<ChatMessage>) -> Session {
        let id = uuid::Uuid::new_v4().to_string();
        let shared = Arc::new(SessionShared::new(id, Arc::clone(&self.logger)));
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        self.logger.info(&format!(
            "[CompletionClient] session {} started with {} message(s)",
            shared.id(),
            messages.len()
        ));

        let task = SessionTask {
            http: self.http.clone(),
            resolver: Arc::clone(&self.resolver),
            temperature: self.temperature,
            logger: Arc::clone(&self.logger),
            messages,
            shared: Arc::clone(&shared),
            tx,
        };
        tokio::spawn(task.run());

        Session::new(shared, rx)
    }
}

impl std::fmt::Debug for StreamingCompletionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingCompletionClient")
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Network side of one session
struct SessionTask {
    http: reqwest::Client,
    resolver: Arc<ConfigResolver>,
    temperature: f32,
    logger: SharedLogger,
    messages: Vec<ChatMessage>,
    shared: Arc<SessionShared>,
    tx: mpsc::Sender<StreamEvent>,
}

impl SessionTask {
    async fn run(self) {
        let cancel = self.shared.cancel_token().clone();

        let terminal = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            event = self.stream() => Some(event),
        };

        match terminal {
            Some(event) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {}
                    _ = self.tx.send(event) => {}
                }
            }
            None => self.logger.debug(&format!(
                "[CompletionClient] session {} stopped by cancellation",
                self.shared.id()
            )),
        }
    }

    /// Drive the request to its terminal event, sending deltas as they arrive
    async fn stream(&self) -> StreamEvent {
        let id = self.shared.id();
        self.shared.advance(SessionState::Connecting);

        let Some(config) = self.resolver.resolve_effective_config().await else {
            self.logger.warn(&format!(
                "[CompletionClient] session {}: no usable configuration",
                id
            ));
            return StreamEvent::Failed(CompletionError::ConfigurationMissing);
        };

        let response = match self.request(&config).await {
            Ok(response) => response,
            Err(e) => {
                self.logger
                    .error(&format!("[CompletionClient] session {}: {}", id, e));
                return StreamEvent::Failed(CompletionError::transport(e));
            }
        };

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = if CompletionError::status_needs_body(status) {
                match response.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        self.logger.warn(&format!(
                            "[CompletionClient] session {}: could not read error body: {}",
                            id, e
                        ));
                        String::new()
                    }
                }
            } else {
                String::new()
            };
            let error = CompletionError::from_status(status, body)
                .unwrap_or_else(|| CompletionError::transport(format!("unexpected status {}", status)));
            self.logger.error(&format!(
                "[CompletionClient] session {}: upstream answered {}",
                id, status
            ));
            return StreamEvent::Failed(error);
        }

        if !self.shared.advance(SessionState::Streaming) {
            return StreamEvent::Cancelled;
        }

        let mut frames = response.bytes_stream().eventsource();
        while let Some(frame) = frames.next().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    self.logger
                        .error(&format!("[CompletionClient] session {}: stream error: {}", id, e));
                    return StreamEvent::Failed(CompletionError::transport(e));
                }
            };

            match parse_frame(&frame.data) {
                Ok(Frame::Sentinel) => return StreamEvent::Done,
                Ok(Frame::Chunk(chunk)) => {
                    for delta in chunk.deltas() {
                        if self.tx.send(delta).await.is_err() {
                            return StreamEvent::Cancelled;
                        }
                    }
                    if chunk.finished {
                        return StreamEvent::Done;
                    }
                }
                Err(e) => {
                    self.logger.warn(&format!(
                        "[CompletionClient] session {}: skipping frame: {}",
                        id, e
                    ));
                }
            }
        }

        StreamEvent::Failed(CompletionError::transport("stream closed before completion"))
    }

    async fn request(&self, config: &EffectiveConfig) -> reqwest::Result<reqwest::Response> {
        let body = CompletionRequest {
            model: &config.model_name,
            messages: &self.messages,
            stream: true,
            temperature: Some(self.temperature),
            max_tokens: None,
        };

        self.logger.debug(&format!(
            "[CompletionClient] POST {} model={}",
            config.completions_url(),
            config.model_name
        ));

        self.http
            .post(config.completions_url())
            .bearer_auth(&config.credential)
            .header(ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await
    }
}
