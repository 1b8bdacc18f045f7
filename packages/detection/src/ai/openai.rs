//! OpenAI-compatible chat-completions client.

use serde::Deserialize;
use tracing::debug;

use crate::error::{DetectError, Result};
use crate::traits::model::{LanguageModel, ModelRequest, ModelResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions client for OpenAI and API-compatible providers.
pub struct OpenAiModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiModel {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read the API key from `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| DetectError::Config("OPENAI_API_KEY is not set".to_string()))?;
        Ok(Self::new(api_key))
    }

    /// Point the client at a compatible provider.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait::async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %request.model, "Calling chat completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| DetectError::Provider(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DetectError::Provider(
                format!("status {status}: {body}").into(),
            ));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| DetectError::Provider(Box::new(e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DetectError::Contract {
                reason: "completion contained no choices".to_string(),
            })?;

        Ok(ModelResponse { content })
    }
}
