//! Prompt composition for each orchestrator operation.

use crate::command::{CommandTable, QUERY_COMMAND};
use crate::context::Context;

/// Snippets included in a context prompt.
pub const PROMPT_SNIPPETS: usize = 3;

/// Characters of trailing screen text included in a context prompt.
pub const PROMPT_RECENT_CHARS: usize = 1000;

const SYSTEM_INSTRUCTIONS: &str = "You are an intelligent coding assistant that provides real-time help to developers.
Analyze the current context and provide relevant, actionable suggestions.

Focus on:
- Code quality and best practices
- Error detection and fixes
- Performance optimization
- Security considerations
- Modern development patterns

Provide concise, practical suggestions that can be immediately applied.";

const OUTPUT_FORMAT: &str = r#"Respond with JSON only, in this format:
{
    "suggestions": [
        {
            "type": "code_fix|optimization|best_practice|security|documentation",
            "title": "Brief title",
            "description": "Detailed description",
            "code": "Code snippet if applicable",
            "priority": "high|medium|low"
        }
    ],
    "summary": "Brief summary of main issues/suggestions",
    "confidence": 0.0-1.0
}"#;

/// Prompt for a context-driven suggestion request.
pub fn context_prompt(
    context: &Context,
    command: Option<&str>,
    query: Option<&str>,
    commands: &CommandTable,
) -> String {
    let mut parts = vec![SYSTEM_INSTRUCTIONS.to_string()];

    if context.code_detected {
        parts.push(format!(
            "\nLanguage: {}",
            context.language.as_deref().unwrap_or("Unknown")
        ));
        parts.push(format!(
            "File type: {}",
            context.file_type.as_deref().unwrap_or("Unknown")
        ));
    }

    if !context.error_indicators.is_empty() {
        let indicators: Vec<&str> = context.error_indicators.iter().map(String::as_str).collect();
        parts.push(format!("Error indicators detected: {}", indicators.join(", ")));
    }

    // A bare "query" command carries no intent of its own; the query line does.
    if let Some(command) = command.filter(|c| !c.is_empty() && *c != QUERY_COMMAND) {
        parts.push(format!("\nUser request: {}", commands.describe(command)));
    }

    if let Some(query) = query.filter(|q| !q.trim().is_empty()) {
        parts.push(format!("\nUser query: {}", query.trim()));
    }

    if !context.code_snippets.is_empty() {
        parts.push("\nCode snippets detected:".to_string());
        for (i, snippet) in context.code_snippets.iter().take(PROMPT_SNIPPETS).enumerate() {
            parts.push(format!("Snippet {}: {}", i + 1, snippet));
        }
    }

    let recent = context.recent_text(PROMPT_RECENT_CHARS);
    if !recent.trim().is_empty() {
        parts.push(format!("\nRecent screen content: {}", recent));
    }

    parts.push(format!("\n{}", OUTPUT_FORMAT));
    parts.join("\n")
}

/// Prompt asking for fixes to the given error text.
pub fn fixes_prompt(error_message: &str, code_context: Option<&str>) -> String {
    format!(
        r#"Suggest fixes for this error:

Error: {}

Code context: {}

Respond with JSON only, in this format:
{{
    "fixes": [
        {{
            "description": "Fix description",
            "code": "Fixed code",
            "explanation": "Why this fixes the issue"
        }}
    ],
    "prevention": "How to prevent this error in the future"
}}"#,
        error_message,
        code_context.filter(|c| !c.trim().is_empty()).unwrap_or("Not provided")
    )
}

/// Prompt asking for a code quality review.
pub fn quality_prompt(code: &str, language: Option<&str>) -> String {
    format!(
        r#"Analyze the following {} for quality issues:

{}

Respond with JSON only, in this format:
{{
    "issues": [
        {{
            "type": "syntax|logic|performance|security|style",
            "severity": "high|medium|low",
            "description": "Issue description",
            "suggestion": "How to fix"
        }}
    ],
    "score": 0.0-1.0,
    "improvements": ["list of improvements"]
}}"#,
        language.unwrap_or("code"),
        code
    )
}

/// Prompt asking for documentation of a code fragment.
pub fn documentation_prompt(code: &str, language: Option<&str>) -> String {
    format!(
        r#"Generate documentation for this {}:

{}

Respond with JSON only, in this format:
{{
    "description": "Function/class description",
    "parameters": ["parameter descriptions"],
    "returns": "Return value description",
    "examples": ["usage examples"],
    "notes": "Additional notes"
}}"#,
        language.unwrap_or("code"),
        code
    )
}
