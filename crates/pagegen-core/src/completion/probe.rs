//! One-shot connectivity check for a candidate configuration

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::client::{CompletionRequest, StreamingCompletionClient};
use crate::types::{ChatMessage, EffectiveConfig};

const PROBE_PROMPT: &str = "Hello";
const PROBE_MAX_TOKENS: u32 = 5;

/// Outcome of [`StreamingCompletionClient::test_connection`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    /// Human-readable summary, suitable for a settings screen
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}

impl ConnectionTestResult {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            model: None,
            usage: None,
        }
    }
}

#[derive(Deserialize)]
struct ProbeResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Value>,
}

impl StreamingCompletionClient {
    /// Send a tiny non-streaming request with `config`
    ///
    /// Used to validate settings before saving them. Never fails; problems
    /// are reported through the result.
    pub async fn test_connection(&self, config: &EffectiveConfig) -> ConnectionTestResult {
        let messages = [ChatMessage::user(PROBE_PROMPT)];
        let body = CompletionRequest {
            model: &config.model_name,
            messages: &messages,
            stream: false,
            temperature: None,
            max_tokens: Some(PROBE_MAX_TOKENS),
        };

        let response = match self
            .http
            .post(config.completions_url())
            .bearer_auth(&config.credential)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.logger
                    .warn(&format!("[CompletionClient] connection test failed: {}", e));
                return ConnectionTestResult::failure(format!("network error: {}", e));
            }
        };

        let status = response.status();
        let result = match status.as_u16() {
            200..=299 => {
                // Reachable and authorized; the body shape is informational.
                let parsed = response.json::<ProbeResponse>().await.ok();
                ConnectionTestResult {
                    success: true,
                    message: "connected, the model is usable".to_string(),
                    model: parsed.as_ref().and_then(|p| p.model.clone()),
                    usage: parsed.and_then(|p| p.usage),
                }
            }
            401 => ConnectionTestResult::failure("API key is invalid, check the configuration"),
            404 => ConnectionTestResult::failure("endpoint URL or model name is wrong"),
            code => {
                let text = response.text().await.unwrap_or_default();
                ConnectionTestResult::failure(format!("connection failed: {} {}", code, text))
            }
        };

        self.logger.info(&format!(
            "[CompletionClient] connection test against {}: {}",
            config.endpoint_base_url, status
        ));
        result
    }
}
