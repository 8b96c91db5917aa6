//! Orchestrator pipeline behavior seen from the public API: cache, rate
//! limit, in-flight dedup, parsing tiers and failure handling.

use crate::integration::test_utils::{fast_settings, OPTIMIZE_RESPONSE};
use sidekick::context::Context;
use sidekick::error::{ErrorKind, ProviderError};
use sidekick::orchestrator::{OrchestratorSettings, SuggestionOrchestrator};
use sidekick::provider::ScriptedProvider;
use sidekick::types::SuggestionType;
use std::sync::Arc;
use std::time::Duration;

fn python_context() -> Context {
    Context::for_code("python", vec!["for item in items: total += item".to_string()])
}

#[tokio::test]
async fn test_repeated_request_is_served_from_cache() {
    let provider = Arc::new(ScriptedProvider::new(vec![OPTIMIZE_RESPONSE.to_string()]));
    let orchestrator = SuggestionOrchestrator::new(provider.clone(), fast_settings());
    let context = python_context();

    let first = orchestrator.generate(&context, Some("optimize"), None).await;
    let second = orchestrator.generate(&context, Some("optimize"), None).await;

    assert_eq!(first, second);
    assert_eq!(provider.call_count(), 1);
    let stats = orchestrator.stats();
    assert_eq!(stats.provider_calls, 1);
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.cache_entries, 1);

    // A different command is a different request.
    orchestrator.generate(&context, Some("explain"), None).await;
    assert_eq!(provider.call_count(), 2);

    orchestrator.clear_cache();
    orchestrator.generate(&context, Some("optimize"), None).await;
    assert_eq!(provider.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_provider_calls_are_spaced_by_min_interval() {
    let provider = Arc::new(ScriptedProvider::always(Ok(OPTIMIZE_RESPONSE.to_string())));
    let orchestrator = SuggestionOrchestrator::new(
        provider.clone(),
        OrchestratorSettings {
            min_interval: Duration::from_secs(1),
            ..OrchestratorSettings::default()
        },
    );

    let requests = ["explain", "optimize", "refactor"].map(|command| {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .generate(&python_context(), Some(command), None)
                .await
        })
    });
    for request in requests {
        assert!(!request.await.unwrap().is_error());
    }

    let mut starts: Vec<_> = provider.calls().into_iter().map(|call| call.at).collect();
    starts.sort();
    assert_eq!(starts.len(), 3);
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_identical_requests_share_one_call() {
    let provider = Arc::new(
        ScriptedProvider::always(Ok(OPTIMIZE_RESPONSE.to_string()))
            .with_delay(Duration::from_secs(2)),
    );
    let orchestrator = SuggestionOrchestrator::new(provider.clone(), fast_settings());
    let context = python_context();

    let (a, b, c) = tokio::join!(
        orchestrator.generate(&context, Some("optimize"), None),
        orchestrator.generate(&context, Some("optimize"), None),
        orchestrator.generate(&context, Some("optimize"), None),
    );

    assert_eq!(provider.call_count(), 1);
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(a.suggestions[0].kind, SuggestionType::Optimization);
    assert_eq!(orchestrator.stats().dedup_joins, 2);
}

#[tokio::test]
async fn test_abandoned_caller_does_not_cancel_shared_call() {
    let provider = Arc::new(
        ScriptedProvider::always(Ok(OPTIMIZE_RESPONSE.to_string()))
            .with_delay(Duration::from_millis(50)),
    );
    let orchestrator = SuggestionOrchestrator::new(provider.clone(), fast_settings());
    let context = python_context();

    let first = tokio::time::timeout(
        Duration::from_millis(5),
        orchestrator.generate(&context, None, None),
    )
    .await;
    assert!(first.is_err());

    let batch = orchestrator.generate(&context, None, None).await;
    assert!(!batch.is_error());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_plain_text_response_uses_fallback() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        "Consider splitting this function into smaller pieces.".to_string(),
    ]));
    let orchestrator = SuggestionOrchestrator::new(provider, fast_settings());

    let batch = orchestrator.generate(&python_context(), None, None).await;
    assert!(!batch.is_error());
    assert_eq!(batch.len(), 1);
    assert_eq!(batch.suggestions[0].kind, SuggestionType::General);
    assert_eq!(
        batch.suggestions[0].description,
        "Consider splitting this function into smaller pieces."
    );
    assert_eq!(batch.confidence, 0.5);
}

#[tokio::test]
async fn test_failures_are_reported_and_retried() {
    let provider = Arc::new(ScriptedProvider::with_results(vec![
        Err(ProviderError::RateLimit("429".to_string())),
        Ok(OPTIMIZE_RESPONSE.to_string()),
    ]));
    let orchestrator = SuggestionOrchestrator::new(provider.clone(), fast_settings());
    let context = python_context();

    let failed = orchestrator.generate(&context, None, None).await;
    assert_eq!(failed.error, Some(ErrorKind::RateLimit));
    assert!(failed.is_empty());

    let retried = orchestrator.generate(&context, None, None).await;
    assert!(!retried.is_error());
    assert_eq!(provider.call_count(), 2);
    assert_eq!(orchestrator.stats().failures, 1);
}

#[tokio::test]
async fn test_uninitialized_makes_no_network_calls() {
    let orchestrator = SuggestionOrchestrator::uninitialized("no credentials", fast_settings());

    let batch = orchestrator
        .suggest_fixes(&["NameError: name 'x' is not defined"], None)
        .await;
    assert_eq!(batch.error, Some(ErrorKind::Uninitialized));
    assert!(batch.is_empty());
    assert_eq!(orchestrator.stats().provider_calls, 0);

    let local = orchestrator.local_suggestions(&Context::for_code(
        "javascript",
        vec!["var total = 0".to_string()],
    ));
    assert_eq!(local.suggestions[0].title, "Use Const/Let");
    assert_eq!(local.suggestions[0].code, "const total");
}

#[tokio::test]
async fn test_fix_and_quality_shapes_are_normalized() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        r#"{"fixes":[{"description":"Define x before use","code":"x = 0","explanation":"x is read before assignment"}],"prevention":"Initialize variables","confidence":0.7}"#.to_string(),
        r#"```json
{"score":0.4,"issues":[{"type":"security","description":"SQL built by string concatenation","suggestion":"Use parameters","severity":"high"}],"improvements":["Use an ORM"]}
```"#.to_string(),
    ]));
    let orchestrator = SuggestionOrchestrator::new(provider, fast_settings());

    let fixes = orchestrator
        .suggest_fixes(&["NameError"], Some("print(x)"))
        .await;
    assert_eq!(fixes.suggestions[0].kind, SuggestionType::CodeFix);
    assert_eq!(fixes.summary, "Initialize variables");

    let quality = orchestrator
        .analyze_code_quality("query = 'select * from t where id=' + id", Some("python"))
        .await;
    assert_eq!(quality.suggestions[0].kind, SuggestionType::Security);
    assert_eq!(quality.summary, "Use an ORM");
    assert_eq!(quality.confidence, 0.4);
}
