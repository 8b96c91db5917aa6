//! Rule-based local suggestions.
//!
//! Rules are plain data: a per-language regex plus a [`Transform`] describing
//! how to build the suggested code from the match. They run without a
//! provider, which makes them the offline path when no credentials exist.

use crate::context::Context;
use crate::error::ConfigError;
use crate::types::{Priority, Suggestion, SuggestionType};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// Upper bound on suggestions returned by one evaluation.
pub const MAX_LOCAL_SUGGESTIONS: usize = 10;

/// How the suggested code is derived from a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// Matched text followed by `suffix`
    AppendSuffix { suffix: String },
    /// Capture-group template (`${1}`, `${name}`)
    TemplateSubstitute { template: String },
    /// Matched text with every `from` replaced by `to`
    ReplaceInMatch { from: String, to: String },
    /// Constant text, independent of the match
    Fixed { text: String },
}

impl Transform {
    fn apply(&self, caps: &Captures<'_>) -> String {
        let matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        match self {
            Transform::AppendSuffix { suffix } => format!("{}{}", matched.trim(), suffix),
            Transform::TemplateSubstitute { template } => {
                let mut out = String::new();
                caps.expand(template, &mut out);
                out
            }
            Transform::ReplaceInMatch { from, to } => matched.replace(from.as_str(), to),
            Transform::Fixed { text } => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub language: String,
    pub pattern: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub priority: Priority,
    pub transform: Transform,
}

impl Rule {
    fn new(
        language: &str,
        pattern: &str,
        title: &str,
        description: &str,
        kind: SuggestionType,
        priority: Priority,
        transform: Transform,
    ) -> Self {
        Self {
            language: language.to_string(),
            pattern: pattern.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            kind,
            priority,
            transform,
        }
    }
}

/// Built-in rule table for python, javascript and html.
pub fn builtin_rules() -> Vec<Rule> {
    use Priority::{High, Medium};
    use SuggestionType::{BestPractice, CodeFix};

    let colon = || Transform::AppendSuffix {
        suffix: ":".to_string(),
    };

    vec![
        Rule::new(
            "python",
            r"(?m)^[ \t]*def\s+\w+\s*\([^)\n]*\)[ \t]*$",
            "Missing Colon",
            "Add missing colon after function definition",
            CodeFix,
            High,
            colon(),
        ),
        Rule::new(
            "python",
            r"(?m)^[ \t]*if\s+[^:\n]*[^:\s][ \t]*$",
            "Missing Colon",
            "Add missing colon after if statement",
            CodeFix,
            High,
            colon(),
        ),
        Rule::new(
            "python",
            r"(?m)^[ \t]*for\s+[^:\n]*[^:\s][ \t]*$",
            "Missing Colon",
            "Add missing colon after for loop",
            CodeFix,
            High,
            colon(),
        ),
        Rule::new(
            "python",
            r"def\s+(\w+)\s*\(([^)\n]*)\)\s*:",
            "Add Type Hints",
            "Consider adding type hints for better code documentation",
            BestPractice,
            Medium,
            Transform::TemplateSubstitute {
                template: "def ${1}(${2}) -> Any:".to_string(),
            },
        ),
        Rule::new(
            "python",
            r"\bprint\s*\(",
            "Use Logging",
            "Replace print statements with proper logging",
            BestPractice,
            Medium,
            Transform::Fixed {
                text: "Use logging instead of print for production code".to_string(),
            },
        ),
        Rule::new(
            "javascript",
            r"console\.log\((\w+)\)",
            "Declare Variable",
            "Variable is used before declaration",
            CodeFix,
            High,
            Transform::TemplateSubstitute {
                template: "let ${1} = 'value';".to_string(),
            },
        ),
        Rule::new(
            "javascript",
            r"\bvar\s+(\w+)",
            "Use Const/Let",
            "Use const/let instead of var for better scoping",
            BestPractice,
            Medium,
            Transform::TemplateSubstitute {
                template: "const ${1}".to_string(),
            },
        ),
        Rule::new(
            "html",
            r"<p>([^<]*)$",
            "Close Tags",
            "HTML tags should be properly closed",
            CodeFix,
            High,
            Transform::TemplateSubstitute {
                template: "<p>${1}</p>".to_string(),
            },
        ),
        Rule::new(
            "html",
            r"<img\s[^>]*>",
            "Add Alt Attribute",
            "Images should have alt attributes for accessibility",
            CodeFix,
            Medium,
            Transform::ReplaceInMatch {
                from: ">".to_string(),
                to: r#" alt="description">"#.to_string(),
            },
        ),
    ]
}

struct CompiledRule {
    rule: Rule,
    regex: Regex,
}

/// Evaluates rules against screen text.
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleEngine {
    /// Compile a rule table; any invalid pattern is an error.
    pub fn new(rules: Vec<Rule>) -> Result<Self, ConfigError> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern).map_err(|e| {
                    ConfigError::Invalid(format!("rule '{}' has an invalid pattern: {}", rule.title, e))
                })?;
                Ok(CompiledRule { rule, regex })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { rules })
    }

    pub fn builtin() -> Self {
        let mut rules = Vec::new();
        for rule in builtin_rules() {
            match Regex::new(&rule.pattern) {
                Ok(regex) => rules.push(CompiledRule { rule, regex }),
                Err(e) => warn!(title = %rule.title, error = %e, "Skipping invalid built-in rule"),
            }
        }
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Suggestions for `code` written in `language`.
    pub fn evaluate(&self, language: &str, code: &str) -> Vec<Suggestion> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for compiled in self
            .rules
            .iter()
            .filter(|c| c.rule.language.eq_ignore_ascii_case(language))
        {
            for caps in compiled.regex.captures_iter(code) {
                let code = compiled.rule.transform.apply(&caps);
                if !seen.insert((compiled.rule.title.clone(), code.clone())) {
                    continue;
                }
                out.push(
                    Suggestion::new(
                        compiled.rule.kind,
                        compiled.rule.title.clone(),
                        compiled.rule.description.clone(),
                        compiled.rule.priority,
                    )
                    .with_code(code),
                );
                if out.len() >= MAX_LOCAL_SUGGESTIONS {
                    return out;
                }
            }
        }
        out
    }

    /// Suggestions for the code visible in a context snapshot.
    pub fn evaluate_context(&self, context: &Context) -> Vec<Suggestion> {
        let Some(language) = context.language.as_deref() else {
            return Vec::new();
        };
        if !context.text_content.trim().is_empty() {
            return self.evaluate(language, &context.text_content);
        }
        let joined = context.code_snippets.join("\n");
        self.evaluate(language, &joined)
    }
}
