//! Text analysis for captured screen content.
//!
//! Language detection walks an ordered table and the first language with any
//! matching pattern wins. Error keywords are matched case-insensitively by
//! containment, so `error:` fires inside `TypeError:`. The short bare words
//! in [`WHOLE_WORD_KEYWORDS`] need word boundaries, so `nan` does not fire
//! inside `banana`.

use crate::context::snapshot::{Context, MAX_SNIPPETS};
use chrono::{DateTime, Utc};
use regex::{Regex, RegexSet};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Ordered language table. Order matters: `class Foo` matches both python
/// and cpp, and python is checked first.
const LANGUAGE_PATTERNS: &[(&str, &[&str])] = &[
    (
        "python",
        &[r"def\s+\w+", r"import\s+\w+", r"class\s+\w+", r"if\s+__name__"],
    ),
    (
        "javascript",
        &[
            r"function\s+\w+",
            r"const\s+\w+",
            r"let\s+\w+",
            r"var\s+\w+",
            r"console\.log",
        ],
    ),
    (
        "typescript",
        &[
            r"interface\s+\w+",
            r"type\s+\w+",
            r"const\s+\w+:\s+\w+",
            r"function\s+\w+\(.*\):",
        ],
    ),
    (
        "java",
        &[r"public\s+class", r"public\s+static\s+void", r"import\s+java"],
    ),
    ("cpp", &[r"#include", r"int\s+main", r"class\s+\w+", r"std::"]),
    ("html", &[r"<!DOCTYPE", r"<html", r"<div", r"<script"]),
    (
        "css",
        &[r"\.\w+\s*\{", r"#\w+\s*\{", r"@media", r"@keyframes"],
    ),
];

const FILE_TYPES: &[(&str, &str)] = &[
    ("python", ".py"),
    ("javascript", ".js"),
    ("typescript", ".ts"),
    ("java", ".java"),
    ("cpp", ".cpp"),
    ("html", ".html"),
    ("css", ".css"),
];

/// Error keywords and the label reported for each.
const ERROR_KEYWORDS: &[(&str, &str)] = &[
    ("error:", "Error"),
    ("exception:", "Exception"),
    ("traceback:", "Traceback"),
    ("failed:", "Failed"),
    ("failure:", "Failure"),
    ("undefined", "Undefined"),
    ("null", "Null"),
    ("nan", "Nan"),
    ("infinity", "Infinity"),
    ("stack trace", "Stack Trace"),
    ("syntax error", "Syntax Error"),
    ("type error", "Type Error"),
    ("reference error", "Reference Error"),
    ("runtime error", "Runtime Error"),
    ("import error", "Import Error"),
    ("module not found", "Module Not Found"),
    ("file not found", "File Not Found"),
    ("permission denied", "Permission Denied"),
    ("access denied", "Access Denied"),
    ("timeout", "Timeout"),
    ("connection refused", "Connection Refused"),
];

/// Keywords too short to match by containment.
const WHOLE_WORD_KEYWORDS: &[&str] = &["nan", "null"];

static LANGUAGE_MATCHERS: LazyLock<Vec<(&'static str, RegexSet)>> = LazyLock::new(|| {
    LANGUAGE_PATTERNS
        .iter()
        .map(|(language, patterns)| {
            let set = RegexSet::new(patterns.iter().map(|p| format!("(?i){}", p)))
                .expect("Invalid language pattern");
            (*language, set)
        })
        .collect()
});

static ERROR_MATCHERS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    ERROR_KEYWORDS
        .iter()
        .map(|(keyword, label)| {
            let escaped = regex::escape(keyword);
            let pattern = if WHOLE_WORD_KEYWORDS.contains(keyword) {
                format!(r"(?i)\b{}\b", escaped)
            } else {
                format!("(?i){}", escaped)
            };
            (Regex::new(&pattern).expect("Invalid error pattern"), *label)
        })
        .collect()
});

static SNIPPET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w\s\(\)\{\}\[\]]{20,}").expect("Invalid snippet pattern"));

/// First language in table order with any matching pattern.
pub fn classify_language(text: &str) -> Option<&'static str> {
    LANGUAGE_MATCHERS
        .iter()
        .find(|(_, set)| set.is_match(text))
        .map(|(language, _)| *language)
}

/// File extension associated with a detected language.
pub fn file_type_for(language: &str) -> Option<&'static str> {
    FILE_TYPES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(language))
        .map(|(_, ext)| *ext)
}

/// Labels of every error keyword present in `text`.
pub fn detect_error_indicators(text: &str) -> BTreeSet<String> {
    ERROR_MATCHERS
        .iter()
        .filter(|(re, _)| re.is_match(text))
        .map(|(_, label)| label.to_string())
        .collect()
}

/// Up to `limit` code-like token runs of at least 20 characters.
pub fn extract_snippets(text: &str, limit: usize) -> Vec<String> {
    SNIPPET_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Turns extracted screen text into a [`Context`].
#[derive(Debug, Clone)]
pub struct ScreenAnalyzer {
    max_snippets: usize,
}

impl Default for ScreenAnalyzer {
    fn default() -> Self {
        Self {
            max_snippets: MAX_SNIPPETS,
        }
    }
}

impl ScreenAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, text: &str, timestamp: DateTime<Utc>) -> Context {
        let language = classify_language(text);
        // Snippets are only meaningful once something looks like code.
        let code_snippets = match language {
            Some(_) => extract_snippets(text, self.max_snippets),
            None => Vec::new(),
        };

        Context {
            timestamp,
            code_detected: language.is_some(),
            language: language.map(str::to_string),
            file_type: language.and_then(file_type_for).map(str::to_string),
            error_indicators: detect_error_indicators(text),
            code_snippets,
            text_content: text.to_string(),
        }
    }

    /// Like [`analyze`](Self::analyze), but with the language already known.
    pub fn analyze_as(&self, text: &str, language: &str, timestamp: DateTime<Utc>) -> Context {
        let language = language.trim().to_lowercase();
        Context {
            file_type: file_type_for(&language).map(str::to_string),
            language: Some(language),
            code_detected: true,
            code_snippets: extract_snippets(text, self.max_snippets),
            ..self.analyze(text, timestamp)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_as_overrides_detection() {
        let analyzer = ScreenAnalyzer::new();
        let context = analyzer.analyze_as("fn main() { let total = compute(values); }", "Python", Utc::now());
        assert_eq!(context.language.as_deref(), Some("python"));
        assert_eq!(context.file_type.as_deref(), Some(".py"));
        assert!(context.code_detected);
        assert_eq!(context.code_snippets.len(), 1);
    }

    #[test]
    fn test_python_wins_over_cpp_for_class() {
        assert_eq!(classify_language("class Widget:\n    pass"), Some("python"));
        assert_eq!(classify_language("#include <vector>\nint main() {}"), Some("cpp"));
    }

    #[test]
    fn test_language_detection_is_case_insensitive() {
        assert_eq!(classify_language("<HTML>"), Some("html"));
        assert_eq!(classify_language("PUBLIC STATIC VOID main"), Some("java"));
        assert_eq!(classify_language("just some prose here"), None);
    }

    #[test]
    fn test_earlier_table_entry_wins_overlaps() {
        // `type\s+\w+` matches inside "doctype html" and typescript is listed first.
        assert_eq!(classify_language("<!DOCTYPE html>"), Some("typescript"));
        assert_eq!(classify_language("<div id=\"row\">"), Some("html"));
    }

    #[test]
    fn test_error_keywords_match_inside_exception_names() {
        let found = detect_error_indicators("TypeError: unsupported operand type(s) for +: 'int' and 'str'");
        assert!(found.contains("Error"), "indicators: {:?}", found);

        let found = detect_error_indicators("ZeroDivisionError: division by zero");
        assert!(found.contains("Error"));

        let found = detect_error_indicators("java.lang.IllegalStateException: closed");
        assert!(found.contains("Exception"));

        let found = detect_error_indicators("Traceback (most recent call last):
NameError: name 'x' is not defined");
        assert!(found.contains("Error"));
        assert!(!found.contains("Traceback"));

        let found = detect_error_indicators("fetchUndefinedValue returned a ConnectTimeout");
        assert!(found.contains("Undefined"));
        assert!(found.contains("Timeout"));
    }

    #[test]
    fn test_error_keywords_respect_word_boundaries() {
        let found = detect_error_indicators("I ate a banana and nothing was annulled");
        assert!(found.is_empty(), "unexpected indicators: {:?}", found);

        let found = detect_error_indicators("error: x is undefined\nSyntax Error near line 3");
        assert!(found.contains("Undefined"));
        assert!(found.contains("Syntax Error"));
        assert!(found.contains("Error"));
    }

    #[test]
    fn test_error_indicators_are_deduplicated() {
        let found = detect_error_indicators("timeout timeout TIMEOUT");
        assert_eq!(found.len(), 1);
        assert!(found.contains("Timeout"));
    }

    #[test]
    fn test_analyze_extracts_snippets_only_for_code() {
        let analyzer = ScreenAnalyzer::new();
        let prose = "This paragraph has plenty of long words but no code at all";
        let context = analyzer.analyze(prose, Utc::now());
        assert!(!context.code_detected);
        assert!(context.code_snippets.is_empty());
        assert_eq!(context.text_content, prose);

        let code = "def compute_total(items):\n    return sum(items)";
        let context = analyzer.analyze(code, Utc::now());
        assert!(context.code_detected);
        assert_eq!(context.language.as_deref(), Some("python"));
        assert_eq!(context.file_type.as_deref(), Some(".py"));
        assert!(!context.code_snippets.is_empty());
        assert!(context.code_snippets.len() <= MAX_SNIPPETS);
    }

    #[test]
    fn test_snippets_are_trimmed_runs() {
        let snippets = extract_snippets(&format!("   ;\n  compute_total(items) {{  }}\n;{};", " ".repeat(24)), 5);
        assert_eq!(snippets, vec!["compute_total(items) {  }".to_string()]);
    }

    #[test]
    fn test_snippet_limit() {
        let text = (0..10)
            .map(|i| format!("function handler{}() {{ run_something_long() }}", i))
            .collect::<Vec<_>>()
            .join(";");
        assert_eq!(extract_snippets(&text, 5).len(), 5);
    }
}
