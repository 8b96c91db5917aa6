//! Shared value types: suggestions, batches and the events that flow between
//! sensors, the activation controller and the presentation gateway.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    CodeFix,
    Optimization,
    BestPractice,
    Security,
    Documentation,
    General,
    Error,
}

impl SuggestionType {
    /// Parse a provider-supplied label. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().replace(&['-', ' '][..], "_").as_str() {
            "code_fix" | "fix" => Some(SuggestionType::CodeFix),
            "optimization" | "performance" => Some(SuggestionType::Optimization),
            "best_practice" | "style" => Some(SuggestionType::BestPractice),
            "security" => Some(SuggestionType::Security),
            "documentation" | "docs" => Some(SuggestionType::Documentation),
            "general" => Some(SuggestionType::General),
            "error" => Some(SuggestionType::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionType::CodeFix => "code_fix",
            SuggestionType::Optimization => "optimization",
            SuggestionType::BestPractice => "best_practice",
            SuggestionType::Security => "security",
            SuggestionType::Documentation => "documentation",
            SuggestionType::General => "general",
            SuggestionType::Error => "error",
        }
    }
}

impl fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" | "critical" => Some(Priority::High),
            "medium" | "normal" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single actionable suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub title: String,
    pub description: String,
    /// Replacement or example code; empty when not applicable.
    #[serde(default)]
    pub code: String,
    pub priority: Priority,
}

impl Suggestion {
    pub fn new(
        kind: SuggestionType,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            code: String::new(),
            priority,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }
}

/// Ordered set of suggestions produced by one orchestrator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionBatch {
    pub suggestions: Vec<Suggestion>,
    pub summary: String,
    /// Provider confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Set when the call failed; `suggestions` is then empty and `summary`
    /// carries the error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl SuggestionBatch {
    pub fn new(suggestions: Vec<Suggestion>, summary: impl Into<String>, confidence: f64) -> Self {
        Self {
            suggestions,
            summary: summary.into(),
            confidence: confidence.clamp(0.0, 1.0),
            error: None,
        }
    }

    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            suggestions: Vec::new(),
            summary: message.into(),
            confidence: 0.0,
            error: Some(kind),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }
}

/// Action bound to a global key chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotkeyAction {
    Activate,
    Deactivate,
    Toggle,
}

impl fmt::Display for HotkeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HotkeyAction::Activate => "activate",
            HotkeyAction::Deactivate => "deactivate",
            HotkeyAction::Toggle => "toggle",
        };
        f.write_str(name)
    }
}

/// Discrete events emitted by the audio and hotkey sensors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SensorEvent {
    HotwordDetected,
    VoiceCommand { command: String, text: String },
    HotkeyPressed { action: HotkeyAction },
}

/// Events delivered back from the presentation gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SuggestionClicked(Suggestion),
    Closed,
}
