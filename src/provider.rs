//! Suggestion provider abstraction
//!
//! A provider turns a fully composed prompt into raw model text. The
//! orchestrator owns prompt composition and response parsing; providers only
//! do transport and map failures onto [`ProviderError`].

use crate::error::{ConfigError, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod scripted;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
pub use scripted::ScriptedProvider;

/// System message sent ahead of every prompt.
pub const SYSTEM_MESSAGE: &str = "You are a helpful coding assistant.";

/// Model text generator.
#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}

/// Which backend a [`ProviderConfig`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    Anthropic,
    Ollama,
    /// Any OpenAI-compatible endpoint (LM Studio, llama.cpp server, ...)
    Local,
}

impl ProviderType {
    /// Environment variable consulted when no key is configured.
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Ollama | ProviderType::Local => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderType::OpenAI | ProviderType::Anthropic)
    }
}

/// Provider section of the assistant configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Falls back to the provider's environment variable when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: ProviderType::default(),
            model: default_model(),
            api_key: None,
            endpoint: None,
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl ProviderConfig {
    /// Configured key, or the provider's environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                self.provider_type
                    .api_key_env_var()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|key| !key.trim().is_empty())
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }
}

/// Builds provider clients from configuration.
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create(config: &ProviderConfig) -> Result<Arc<dyn SuggestionProvider>, ConfigError> {
        if config.model.trim().is_empty() {
            return Err(ConfigError::Invalid("provider model is empty".to_string()));
        }
        let timeout = config.request_timeout();

        match config.provider_type {
            ProviderType::OpenAI => {
                let api_key = Self::required_key(config)?;
                Ok(Arc::new(OpenAIClient::new(
                    config.model.clone(),
                    Some(api_key),
                    config.endpoint.clone(),
                    timeout,
                )?))
            }
            ProviderType::Anthropic => {
                let api_key = Self::required_key(config)?;
                Ok(Arc::new(AnthropicClient::new(
                    config.model.clone(),
                    api_key,
                    config.endpoint.clone(),
                    timeout,
                )?))
            }
            ProviderType::Ollama => Ok(Arc::new(OllamaClient::new(
                config.model.clone(),
                config.endpoint.clone(),
                timeout,
            )?)),
            ProviderType::Local => {
                let endpoint = config.endpoint.clone().ok_or_else(|| {
                    ConfigError::Invalid("local provider requires an endpoint".to_string())
                })?;
                Ok(Arc::new(
                    OpenAIClient::new(
                        config.model.clone(),
                        config.resolve_api_key(),
                        Some(endpoint),
                        timeout,
                    )?
                    .with_name("local"),
                ))
            }
        }
    }

    fn required_key(config: &ProviderConfig) -> Result<String, ConfigError> {
        config.resolve_api_key().ok_or_else(|| {
            let hint = config.provider_type.api_key_env_var().unwrap_or("api_key");
            ConfigError::MissingCredentials(format!(
                "no API key configured for {:?} provider (set {})",
                config.provider_type, hint
            ))
        })
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_provider_http_client(request_timeout: Duration) -> Result<Client, ConfigError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| ConfigError::Invalid(format!("Failed to create HTTP client: {}", e)))
}

/// Map transport failures onto provider error kinds.
pub(crate) fn map_http_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(error.to_string())
    } else if error.is_connect() {
        ProviderError::Network(format!("Connection error: {}", error))
    } else if let Some(status) = error.status() {
        map_status(status, error.to_string())
    } else if error.is_decode() {
        ProviderError::InvalidResponse(error.to_string())
    } else {
        ProviderError::Network(format!("HTTP error: {}", error))
    }
}

/// Map a non-success HTTP status onto a provider error kind.
pub(crate) fn map_status(status: StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Auth(format!("Authentication failed: {}", body)),
        429 => ProviderError::RateLimit(format!("Rate limit exceeded: {}", body)),
        408 | 504 => ProviderError::Timeout(format!("Upstream timeout: {}", body)),
        502 | 503 => ProviderError::Network(format!("Service unavailable ({}): {}", status, body)),
        _ => ProviderError::Other(format!("Request failed with status {}: {}", status, body)),
    }
}

/// Read an error body without failing on unreadable payloads.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}
