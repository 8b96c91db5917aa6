//! Configuration System
//!
//! Layered configuration for the assistant: merge-policy defaults, the global
//! config file, workspace files and `SIDEKICK__SECTION__KEY` environment
//! overrides, in increasing priority. Tests included.

use crate::command::CommandTable;
use crate::logging::LoggingConfig;
use crate::orchestrator::OrchestratorSettings;
use crate::sensor::{AudioSettings, Chord, HotkeyBinding};
use crate::types::HotkeyAction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use crate::provider::{ProviderConfig, ProviderType};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub screen: ScreenConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub hotkeys: HotkeyConfig,

    /// Voice command keywords, in match order
    #[serde(default)]
    pub commands: CommandTable,

    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    #[serde(default)]
    pub presentation: PresentationConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    #[serde(default = "default_capture_interval")]
    pub capture_interval_seconds: f64,

    /// File whose contents stand in for the screen text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_file: Option<PathBuf>,

    /// Command whose stdout is the screen text (an OCR pipeline, for instance)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_command: Option<String>,
}

fn default_capture_interval() -> f64 {
    2.0
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            capture_interval_seconds: default_capture_interval(),
            text_file: None,
            text_command: None,
        }
    }
}

impl ScreenConfig {
    pub fn capture_interval(&self) -> Duration {
        seconds(self.capture_interval_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_hotword")]
    pub hotword: String,

    #[serde(default = "default_listen_window")]
    pub listen_window_seconds: f64,

    #[serde(default = "default_command_window")]
    pub command_window_seconds: f64,

    #[serde(default = "default_language")]
    pub language: String,
}

fn default_true() -> bool {
    true
}

fn default_hotword() -> String {
    "hey copilot".to_string()
}

fn default_listen_window() -> f64 {
    2.0
}

fn default_command_window() -> f64 {
    3.0
}

fn default_language() -> String {
    "en-US".to_string()
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hotword: default_hotword(),
            listen_window_seconds: default_listen_window(),
            command_window_seconds: default_command_window(),
            language: default_language(),
        }
    }
}

impl AudioConfig {
    pub fn settings(&self) -> AudioSettings {
        AudioSettings {
            hotword: self.hotword.clone(),
            listen_window: seconds(self.listen_window_seconds),
            command_window: seconds(self.command_window_seconds),
            language: self.language.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_activate_chord", skip_serializing_if = "Option::is_none")]
    pub activate: Option<Chord>,

    #[serde(default = "default_deactivate_chord", skip_serializing_if = "Option::is_none")]
    pub deactivate: Option<Chord>,

    #[serde(default = "default_toggle_chord", skip_serializing_if = "Option::is_none")]
    pub toggle: Option<Chord>,

    /// Poll interval for backends without press subscriptions
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_activate_chord() -> Option<Chord> {
    Chord::parse("ctrl+shift+c").ok()
}

fn default_deactivate_chord() -> Option<Chord> {
    Chord::parse("escape").ok()
}

fn default_toggle_chord() -> Option<Chord> {
    Chord::parse("ctrl+shift+o").ok()
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            activate: default_activate_chord(),
            deactivate: default_deactivate_chord(),
            toggle: default_toggle_chord(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl HotkeyConfig {
    /// Configured chords paired with their actions.
    pub fn bindings(&self) -> Vec<HotkeyBinding> {
        [
            (&self.activate, HotkeyAction::Activate),
            (&self.deactivate, HotkeyAction::Deactivate),
            (&self.toggle, HotkeyAction::Toggle),
        ]
        .into_iter()
        .filter_map(|(chord, action)| chord.clone().map(|c| HotkeyBinding::new(c, action)))
        .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Minimum spacing between provider calls
    #[serde(default = "default_min_call_interval")]
    pub min_call_interval_seconds: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Period of context-driven suggestions while active
    #[serde(default = "default_suggestion_interval")]
    pub suggestion_interval_seconds: f64,
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_min_call_interval() -> f64 {
    1.0
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_suggestion_interval() -> f64 {
    5.0
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl_seconds: default_cache_ttl(),
            min_call_interval_seconds: default_min_call_interval(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            suggestion_interval_seconds: default_suggestion_interval(),
        }
    }
}

impl OrchestratorConfig {
    pub fn settings(&self, commands: &CommandTable) -> OrchestratorSettings {
        OrchestratorSettings {
            cache_enabled: self.cache_enabled,
            cache_ttl: Duration::from_secs(self.cache_ttl_seconds),
            min_interval: seconds(self.min_call_interval_seconds),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            commands: commands.clone(),
        }
    }

    pub fn suggestion_interval(&self) -> Duration {
        seconds(self.suggestion_interval_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationConfig {
    /// Hide (and go idle) after this long without a new display; 0 disables
    #[serde(default = "default_auto_hide")]
    pub auto_hide_seconds: u64,
}

fn default_auto_hide() -> u64 {
    30
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            auto_hide_seconds: default_auto_hide(),
        }
    }
}

impl PresentationConfig {
    pub fn auto_hide(&self) -> Option<Duration> {
        (self.auto_hide_seconds > 0).then(|| Duration::from_secs(self.auto_hide_seconds))
    }
}

/// Negative, NaN or overflowing values collapse to zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Configuration validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Screen: {0}")]
    Screen(String),

    #[error("Audio: {0}")]
    Audio(String),

    #[error("Hotkeys: {0}")]
    Hotkeys(String),

    #[error("Commands: {0}")]
    Commands(String),

    #[error("Orchestrator: {0}")]
    Orchestrator(String),

    #[error("Provider: {0}")]
    Provider(String),

    #[error("Logging: {0}")]
    Logging(String),
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl AssistantConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !positive(self.screen.capture_interval_seconds) {
            errors.push(ValidationError::Screen(
                "capture_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.screen.text_file.is_some() && self.screen.text_command.is_some() {
            errors.push(ValidationError::Screen(
                "set at most one of text_file and text_command".to_string(),
            ));
        }

        if self.audio.enabled {
            if self.audio.hotword.trim().is_empty() {
                errors.push(ValidationError::Audio("hotword cannot be empty".to_string()));
            }
            if !positive(self.audio.listen_window_seconds) || !positive(self.audio.command_window_seconds) {
                errors.push(ValidationError::Audio(
                    "listen and command windows must be greater than zero".to_string(),
                ));
            }
        }

        if self.hotkeys.enabled {
            let bindings = self.hotkeys.bindings();
            let distinct: HashSet<_> = bindings.iter().map(|b| &b.chord).collect();
            if distinct.len() != bindings.len() {
                errors.push(ValidationError::Hotkeys(
                    "the same chord is bound to more than one action".to_string(),
                ));
            }
            if self.hotkeys.poll_interval_ms == 0 {
                errors.push(ValidationError::Hotkeys(
                    "poll_interval_ms must be greater than zero".to_string(),
                ));
            }
        }

        let mut keywords = HashSet::new();
        for entry in self.commands.entries() {
            let keyword = entry.keyword.trim().to_lowercase();
            if keyword.is_empty() {
                errors.push(ValidationError::Commands("command keyword cannot be empty".to_string()));
            } else if !keywords.insert(keyword) {
                errors.push(ValidationError::Commands(format!(
                    "duplicate command keyword '{}'",
                    entry.keyword
                )));
            }
        }

        let orchestrator = &self.orchestrator;
        if !(0.0..=2.0).contains(&orchestrator.temperature) {
            errors.push(ValidationError::Orchestrator(format!(
                "temperature {} is outside 0.0..=2.0",
                orchestrator.temperature
            )));
        }
        if orchestrator.max_tokens == 0 {
            errors.push(ValidationError::Orchestrator("max_tokens must be greater than zero".to_string()));
        }
        if orchestrator.cache_enabled && orchestrator.cache_ttl_seconds == 0 {
            errors.push(ValidationError::Orchestrator(
                "cache_ttl_seconds must be greater than zero when caching is enabled".to_string(),
            ));
        }
        if !orchestrator.min_call_interval_seconds.is_finite() || orchestrator.min_call_interval_seconds < 0.0 {
            errors.push(ValidationError::Orchestrator(
                "min_call_interval_seconds cannot be negative".to_string(),
            ));
        }
        if !positive(orchestrator.suggestion_interval_seconds) {
            errors.push(ValidationError::Orchestrator(
                "suggestion_interval_seconds must be greater than zero".to_string(),
            ));
        }

        if let Err(e) = self.validate_provider() {
            errors.push(ValidationError::Provider(e));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    // Missing credentials are not a validation failure: the orchestrator
    // runs uninitialized instead.
    fn validate_provider(&self) -> Result<(), String> {
        let provider = &self.provider;
        if provider.model.trim().is_empty() {
            return Err("model cannot be empty".to_string());
        }
        if let Some(endpoint) = &provider.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("endpoint '{}' is not an http(s) URL", endpoint));
            }
        } else if provider.provider_type == ProviderType::Local {
            return Err("local provider requires an endpoint".to_string());
        }
        if provider.request_timeout_seconds == 0 {
            return Err("request_timeout_seconds must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, crate::error::ConfigError> {
        toml::to_string_pretty(self).map_err(|e| crate::error::ConfigError::Invalid(e.to_string()))
    }
}
