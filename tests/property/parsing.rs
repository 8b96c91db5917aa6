//! Response parsing never fails and always yields a bounded confidence.

use proptest::prelude::*;
use sidekick::orchestrator::{parse_response, Fingerprint, RequestKind};
use sidekick::types::SuggestionType;

#[test]
fn test_arbitrary_text_parses() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&".*", |raw: String| {
            let batch = parse_response(&raw);
            prop_assert!(!batch.is_error());
            prop_assert!((0.0..=1.0).contains(&batch.confidence));
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_structured_confidence_is_clamped() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(
            &(any::<f64>(), "[a-z ]{1,20}", prop::bool::ANY),
            |(confidence, title, fenced)| {
                let body = serde_json::json!({
                    "suggestions": [{"type": "security", "title": &title, "description": "d", "priority": "high"}],
                    "summary": "s",
                    "confidence": if confidence.is_finite() { serde_json::json!(confidence) } else { serde_json::Value::Null },
                })
                .to_string();
                let raw = if fenced {
                    format!("```json\n{}\n```", body)
                } else {
                    body
                };

                let batch = parse_response(&raw);
                prop_assert!((0.0..=1.0).contains(&batch.confidence));
                if title.trim().is_empty() {
                    prop_assert!(batch.is_empty());
                } else {
                    prop_assert_eq!(batch.len(), 1);
                    prop_assert_eq!(batch.suggestions[0].kind, SuggestionType::Security);
                }
                Ok(())
            },
        )
        .unwrap();
}

#[test]
fn test_fingerprint_is_stable() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&(".*", ".*"), |(a, b): (String, String)| {
            let first = Fingerprint::compute(RequestKind::Suggestions, &a);
            prop_assert_eq!(first, Fingerprint::compute(RequestKind::Suggestions, &a));
            prop_assert_ne!(first, Fingerprint::compute(RequestKind::Fixes, &a));
            if a != b {
                prop_assert_ne!(first, Fingerprint::compute(RequestKind::Suggestions, &b));
            }
            Ok(())
        })
        .unwrap();
}
