//! OpenAI-compatible chat client
//!
//! The wire shape is `/chat/completions` with a bearer token. Hosted
//! gateways, self-hosted routers and local inference servers all speak
//! this dialect, so the model endpoint stays swappable through config.

use crate::types::{ApiError, ChatMessage, ChatRequest, ChatResponse};
use crate::{CompletionProvider, CompletionRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use vigil_core::{LlmConfig, LlmError};

/// Chat-completion client over an OpenAI-compatible endpoint.
pub struct ChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    /// Build a client from configuration.
    ///
    /// # Returns
    /// * `Err(LlmError::NotConfigured)` - if no API key is present
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if !config.is_configured() {
            return Err(LlmError::NotConfigured);
        }
        Ok(Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_error_status(&self, status: StatusCode, body: String) -> LlmError {
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        LlmError::RequestFailed {
            provider: "openai-compatible".to_string(),
            status: status.as_u16() as i32,
            message,
        }
    }
}

#[async_trait]
impl CompletionProvider for ChatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: "openai-compatible".to_string(),
                status: 0,
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.map_error_status(status, body));
        }

        let parsed: ChatResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: "openai-compatible".to_string(),
                reason: format!("response body is not chat JSON: {}", e),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: "openai-compatible".to_string(),
                reason: "response contained no choices".to_string(),
            })
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
