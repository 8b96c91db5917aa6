//! Error types for the sidekick suggestion engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by a suggestion provider (remote or local model).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider authentication failed: {0}")]
    Auth(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Provider network error: {0}")]
    Network(String),

    #[error("Provider request timed out: {0}")]
    Timeout(String),

    #[error("Provider returned an unusable response: {0}")]
    InvalidResponse(String),

    #[error("Provider error: {0}")]
    Other(String),
}

impl ProviderError {
    /// Kind recorded on the suggestion batch handed back to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Auth(_) => ErrorKind::Auth,
            ProviderError::RateLimit(_) => ErrorKind::RateLimit,
            ProviderError::Network(_) => ErrorKind::Network,
            ProviderError::Timeout(_) => ErrorKind::Timeout,
            ProviderError::InvalidResponse(_) | ProviderError::Other(_) => ErrorKind::Provider,
        }
    }
}

/// Failures inside a sensor loop. Never fatal: the loop logs and keeps going.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SensorError {
    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("No speech detected")]
    NoSpeechDetected,

    #[error("Speech recognition service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Hotkey backend error: {0}")]
    Hotkey(String),

    #[error("Invalid key chord '{0}'")]
    InvalidChord(String),

    #[error("Sensor source closed")]
    Closed,
}

/// Configuration and initialization failures. Only these may prevent startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

/// Error classification carried on a [`crate::types::SuggestionBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    RateLimit,
    Network,
    Timeout,
    Provider,
    /// The orchestrator never finished initialization (e.g. no API key).
    Uninitialized,
    /// The request was abandoned before the provider answered.
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Auth => "auth",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Provider => "provider",
            ErrorKind::Uninitialized => "uninitialized",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Failures surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Configuration validation failed:\n{0}")]
    Validation(String),

    #[error("Failed to read {path}: {message}")]
    Input { path: String, message: String },

    #[error("No input: pass --file or --code")]
    MissingInput,

    #[error("Suggestion request failed ({kind}): {message}")]
    Request { kind: ErrorKind, message: String },

    #[error("Failed to render output: {0}")]
    Output(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}
