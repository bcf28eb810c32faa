//! LLM backend implementations
//!
//! The only production backend is an OpenAI-compatible chat-completions
//! client. Every call carries the configured timeout so a slow model cannot
//! hang a chat turn.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use realty_config::LlmSettings;

use crate::prompt::Message;
use crate::LlmError;

/// LLM backend seam
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Run one chat completion and return the assistant text.
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible backend
///
/// Works with OpenAI itself and with any server exposing the
/// `/chat/completions` shape.
pub struct OpenAiBackend {
    settings: LlmSettings,
    client: Client,
}

impl OpenAiBackend {
    pub fn new(settings: LlmSettings) -> Result<Self, LlmError> {
        if settings.api_key.is_empty() && !settings.endpoint.starts_with("http://localhost") {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { settings, client })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages,
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
        };

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {status}: {error_text}")));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        let text = choice.message.content.trim().to_string();
        if text.is_empty() {
            return Err(LlmError::InvalidResponse("Empty completion".to_string()));
        }

        tracing::debug!(model = %self.settings.model, chars = text.len(), "LLM completion");
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}

// OpenAI API wire types
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: String,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
