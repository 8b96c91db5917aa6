//! Two-tier response parsing.
//!
//! Tier one is a strict JSON parse of the (optionally code-fenced) response.
//! Anything that is not a JSON object falls through to tier two, which wraps
//! the raw text in a single general suggestion. Parsing never fails.

use crate::types::{Priority, Suggestion, SuggestionBatch, SuggestionType};
use serde_json::{Map, Value};
use tracing::debug;

/// Confidence used when the response does not state one.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Characters of raw text kept in a fallback summary.
pub const SUMMARY_LIMIT: usize = 200;

/// Title of the suggestion produced by the plain-text fallback.
pub const FALLBACK_TITLE: &str = "AI Suggestion";

/// Title given to entries of a `fixes` response.
pub const FIX_TITLE: &str = "Error Fix";

/// Parse a raw provider response into a batch.
pub fn parse_response(raw: &str) -> SuggestionBatch {
    if raw.trim().is_empty() {
        return SuggestionBatch::new(Vec::new(), "", DEFAULT_CONFIDENCE);
    }

    match structured(raw) {
        Some(object) => from_object(&object),
        None => {
            debug!(len = raw.len(), "Response is not structured, using text fallback");
            fallback(raw)
        }
    }
}

/// Tier one: a JSON object, possibly wrapped in a markdown code fence.
fn structured(raw: &str) -> Option<Map<String, Value>> {
    let body = strip_code_fence(raw.trim());
    if !body.starts_with('{') {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Tier two: the whole response as one general suggestion.
pub fn fallback(raw: &str) -> SuggestionBatch {
    let suggestion = Suggestion::new(SuggestionType::General, FALLBACK_TITLE, raw, Priority::Medium);
    SuggestionBatch::new(vec![suggestion], truncate_summary(raw), DEFAULT_CONFIDENCE)
}

/// First [`SUMMARY_LIMIT`] characters, with an ellipsis when cut.
pub fn truncate_summary(text: &str) -> String {
    if text.chars().count() > SUMMARY_LIMIT {
        let head: String = text.chars().take(SUMMARY_LIMIT).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

fn from_object(object: &Map<String, Value>) -> SuggestionBatch {
    if let Some(Value::Array(items)) = object.get("suggestions") {
        let suggestions = items.iter().filter_map(suggestion_entry).collect();
        return SuggestionBatch::new(
            suggestions,
            string_field(object, "summary"),
            confidence(object.get("confidence")),
        );
    }

    if let Some(Value::Array(items)) = object.get("fixes") {
        let suggestions = items.iter().filter_map(fix_entry).collect();
        return SuggestionBatch::new(
            suggestions,
            string_field(object, "prevention"),
            confidence(object.get("confidence")),
        );
    }

    if let Some(Value::Array(items)) = object.get("issues") {
        let suggestions = items.iter().filter_map(issue_entry).collect();
        let summary = match object.get("improvements") {
            Some(Value::Array(list)) => list
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; "),
            _ => String::new(),
        };
        return SuggestionBatch::new(suggestions, summary, confidence(object.get("score")));
    }

    if looks_like_documentation(object) {
        return documentation_entry(object);
    }

    // A JSON object without any recognised list: parsed, but empty.
    SuggestionBatch::new(
        Vec::new(),
        string_field(object, "summary"),
        confidence(object.get("confidence")),
    )
}

fn suggestion_entry(value: &Value) -> Option<Suggestion> {
    let object = value.as_object()?;
    let title = string_field(object, "title");
    if title.trim().is_empty() {
        return None;
    }
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .and_then(SuggestionType::from_label)
        .unwrap_or(SuggestionType::General);
    let priority = object
        .get("priority")
        .and_then(Value::as_str)
        .and_then(Priority::from_label)
        .unwrap_or(Priority::Medium);

    Some(
        Suggestion::new(kind, title.trim(), string_field(object, "description"), priority)
            .with_code(string_field(object, "code")),
    )
}

fn fix_entry(value: &Value) -> Option<Suggestion> {
    let object = value.as_object()?;
    let description = string_field(object, "description");
    let explanation = string_field(object, "explanation");
    let code = string_field(object, "code");
    if description.trim().is_empty() && code.trim().is_empty() {
        return None;
    }
    let description = if explanation.trim().is_empty() {
        description
    } else {
        format!("{}\n\n{}", description, explanation)
    };
    Some(Suggestion::new(SuggestionType::CodeFix, FIX_TITLE, description, Priority::High).with_code(code))
}

fn issue_entry(value: &Value) -> Option<Suggestion> {
    let object = value.as_object()?;
    let description = string_field(object, "description");
    if description.trim().is_empty() {
        return None;
    }
    let issue_type = string_field(object, "type").to_lowercase();
    let kind = match issue_type.as_str() {
        "syntax" | "logic" => SuggestionType::CodeFix,
        "performance" => SuggestionType::Optimization,
        "security" => SuggestionType::Security,
        "style" => SuggestionType::BestPractice,
        other => SuggestionType::from_label(other).unwrap_or(SuggestionType::General),
    };
    let priority = object
        .get("severity")
        .and_then(Value::as_str)
        .and_then(Priority::from_label)
        .unwrap_or(Priority::Medium);
    let mut chars = issue_type.chars();
    let title = match chars.next() {
        Some(first) => format!("{}{} issue", first.to_uppercase(), chars.as_str()),
        None => "Code issue".to_string(),
    };
    let fix = string_field(object, "suggestion");
    let description = if fix.trim().is_empty() {
        description
    } else {
        format!("{}\n\nSuggested fix: {}", description, fix)
    };
    Some(Suggestion::new(kind, title, description, priority))
}

fn looks_like_documentation(object: &Map<String, Value>) -> bool {
    object.contains_key("description")
        && ["parameters", "returns", "examples", "notes"]
            .iter()
            .any(|key| object.contains_key(*key))
}

fn documentation_entry(object: &Map<String, Value>) -> SuggestionBatch {
    let mut body = string_field(object, "description");
    if let Some(Value::Array(params)) = object.get("parameters") {
        let params: Vec<&str> = params.iter().filter_map(Value::as_str).collect();
        if !params.is_empty() {
            body.push_str("\n\nParameters:\n");
            body.push_str(
                &params
                    .iter()
                    .map(|p| format!("- {}", p))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }
    }
    let returns = string_field(object, "returns");
    if !returns.trim().is_empty() {
        body.push_str(&format!("\n\nReturns: {}", returns));
    }
    let examples = match object.get("examples") {
        Some(Value::Array(list)) => list
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    };

    let suggestion = Suggestion::new(
        SuggestionType::Documentation,
        "Documentation",
        body,
        Priority::Low,
    )
    .with_code(examples);
    SuggestionBatch::new(
        vec![suggestion],
        string_field(object, "notes"),
        confidence(object.get("confidence")),
    )
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn confidence(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0)
}
