//! Voice command keyword table.
//!
//! Ordered: classification walks the table top to bottom and the first
//! keyword contained in the utterance wins.

use serde::{Deserialize, Serialize};

/// Command emitted when no keyword matches.
pub const QUERY_COMMAND: &str = "query";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    pub keyword: String,
    /// Replaces the keyword in the prompt's user request line
    pub description: String,
}

impl CommandEntry {
    pub fn new(keyword: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
}

impl Default for CommandTable {
    fn default() -> Self {
        Self {
            entries: vec![
                CommandEntry::new("explain", "Explain the current code"),
                CommandEntry::new("fix", "Suggest fixes for errors"),
                CommandEntry::new("optimize", "Optimize the current code"),
                CommandEntry::new("document", "Generate documentation"),
                CommandEntry::new("test", "Generate test cases"),
                CommandEntry::new("refactor", "Suggest refactoring"),
                CommandEntry::new("debug", "Help debug issues"),
            ],
        }
    }
}

impl CommandTable {
    pub fn new(entries: Vec<CommandEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    /// Keyword of the first entry contained in `text` (case-insensitive),
    /// or [`QUERY_COMMAND`].
    pub fn classify(&self, text: &str) -> &str {
        let lowered = text.to_lowercase();
        self.entries
            .iter()
            .find(|entry| {
                let keyword = entry.keyword.trim().to_lowercase();
                !keyword.is_empty() && lowered.contains(&keyword)
            })
            .map(|entry| entry.keyword.as_str())
            .unwrap_or(QUERY_COMMAND)
    }

    /// Description for a keyword; unknown keywords describe themselves.
    pub fn describe<'a>(&'a self, keyword: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|entry| entry.keyword.eq_ignore_ascii_case(keyword))
            .map(|entry| entry.description.as_str())
            .unwrap_or(keyword)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
