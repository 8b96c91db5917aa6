//! Anthropic messages API client.

use super::{build_provider_http_client, error_body, map_http_error, map_status, SuggestionProvider, SYSTEM_MESSAGE};
use crate::error::{ConfigError, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicClient {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(
        model: String,
        api_key: String,
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
            model,
            api_key,
            base_url,
        })
    }

    /// Concatenate the text blocks of a messages response.
    pub(crate) fn extract_content(body: &str) -> Result<String, ProviderError> {
        let response: MessagesResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        let text: String = response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();
        Ok(text)
    }
}

#[async_trait]
impl SuggestionProvider for AnthropicClient {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let request_body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "system": SYSTEM_MESSAGE,
            "messages": [{"role": "user", "content": prompt}],
        });

        let url = format!("{}/messages", self.base_url);
        debug!(provider = "anthropic", model = %self.model, "Sending messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status(status, error_body(response).await));
        }

        let body = response.text().await.map_err(map_http_error)?;
        Self::extract_content(&body)
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_content_joins_text_blocks() {
        let body = r#"{"content":[{"type":"text","text":"{\"summary\":"},{"type":"text","text":"\"ok\"}"}],"model":"m"}"#;
        assert_eq!(
            AnthropicClient::extract_content(body).unwrap(),
            r#"{"summary":"ok"}"#
        );
    }

    #[test]
    fn test_extract_content_rejects_garbage() {
        assert!(AnthropicClient::extract_content("not json").is_err());
    }
}
