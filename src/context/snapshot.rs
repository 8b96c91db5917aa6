//! The environment snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Maximum number of code snippets kept per snapshot.
pub const MAX_SNIPPETS: usize = 5;

/// Latest full description of what is on screen.
///
/// Produced wholesale by the screen sensor on every capture cycle. A new
/// snapshot always replaces the previous one; fields are never merged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Context {
    /// When the capture that produced this snapshot completed
    pub timestamp: DateTime<Utc>,

    /// Whether any language pattern matched
    pub code_detected: bool,

    /// Detected language (e.g. "python")
    #[serde(default)]
    pub language: Option<String>,

    /// File extension associated with the detected language (e.g. ".py")
    #[serde(default)]
    pub file_type: Option<String>,

    /// Error indicator labels found on screen (deduplicated, unordered)
    #[serde(default)]
    pub error_indicators: BTreeSet<String>,

    /// Code-like token runs, at most [`MAX_SNIPPETS`]
    #[serde(default)]
    pub code_snippets: Vec<String>,

    /// Raw extracted text
    #[serde(default)]
    pub text_content: String,
}

impl Context {
    /// Build a snapshot for a language and snippets without going through OCR.
    pub fn for_code(language: &str, snippets: Vec<String>) -> Self {
        let mut code_snippets = snippets;
        code_snippets.truncate(MAX_SNIPPETS);
        Self {
            timestamp: Utc::now(),
            code_detected: true,
            language: Some(language.to_string()),
            file_type: crate::context::analysis::file_type_for(language).map(str::to_string),
            error_indicators: BTreeSet::new(),
            code_snippets,
            text_content: String::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.error_indicators.is_empty()
    }

    /// Last `max_chars` characters of the extracted text.
    pub fn recent_text(&self, max_chars: usize) -> &str {
        let count = self.text_content.chars().count();
        if count <= max_chars {
            return &self.text_content;
        }
        let skip = count - max_chars;
        let start = self
            .text_content
            .char_indices()
            .nth(skip)
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        &self.text_content[start..]
    }
}
