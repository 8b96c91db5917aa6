//! OpenAI-compatible chat completions client.

use super::{build_provider_http_client, error_body, map_http_error, map_status, SuggestionProvider, SYSTEM_MESSAGE};
use crate::error::{ConfigError, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for OpenAI and any server speaking its chat completions API.
pub struct OpenAIClient {
    client: Client,
    name: &'static str,
    model: String,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let client = build_provider_http_client(request_timeout)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            name: "openai",
            model,
            api_key,
            base_url,
        })
    }

    /// Report under a different provider name (used for local endpoints).
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Chat completions route under `base_url`.
    pub(crate) fn completions_url(base_url: &str) -> String {
        format!("{}/chat/completions", base_url)
    }

    /// Extract the first choice's text from a response body.
    pub(crate) fn extract_content(body: &str) -> Result<String, ProviderError> {
        let completion: ChatCompletionResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))
    }
}

#[async_trait]
impl SuggestionProvider for OpenAIClient {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens,
            temperature,
            stream: false,
        };

        let url = Self::completions_url(&self.base_url);
        debug!(provider = self.name, model = %self.model, url = %url, "Sending completion request");

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(map_http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(map_status(status, error_body(response).await));
        }

        let body = response.text().await.map_err(map_http_error)?;
        Self::extract_content(&body)
    }

    fn provider_name(&self) -> &str {
        self.name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
