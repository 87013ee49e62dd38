//! Effective endpoint/credential/model triple

use serde::{Deserialize, Serialize};

/// The configuration actually used for a completion request
///
/// Field names on the wire follow the stored format
/// (`apiUrl`, `apiKey`, `modelName`). A value with any empty field is
/// treated as absent, see [`EffectiveConfig::into_complete`].
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveConfig {
    /// Base URL of the OpenAI-compatible endpoint, without `/chat/completions`
    #[serde(rename = "apiUrl", default)]
    pub endpoint_base_url: String,
    /// Bearer credential
    #[serde(rename = "apiKey", default)]
    pub credential: String,
    /// Model identifier sent in the request body
    #[serde(default)]
    pub model_name: String,
}

impl EffectiveConfig {
    pub fn new(
        endpoint_base_url: impl Into<String>,
        credential: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_base_url: endpoint_base_url.into(),
            credential: credential.into(),
            model_name: model_name.into(),
        }
    }

    /// Whether all three required fields are non-empty
    pub fn is_complete(&self) -> bool {
        !self.endpoint_base_url.trim().is_empty()
            && !self.credential.trim().is_empty()
            && !self.model_name.trim().is_empty()
    }

    /// Keep the value only if it is complete
    pub fn into_complete(self) -> Option<Self> {
        self.is_complete().then_some(self)
    }

    /// `{endpoint}/chat/completions`, tolerating a trailing slash on the base
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint_base_url.trim_end_matches('/'))
    }
}

// Credential stays out of logs and panic messages.
impl std::fmt::Debug for EffectiveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectiveConfig")
            .field("endpoint_base_url", &self.endpoint_base_url)
            .field("credential", &"<redacted>")
            .field("model_name", &self.model_name)
            .finish()
    }
}
