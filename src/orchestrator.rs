//! Suggestion orchestrator
//!
//! Turns context (or explicit code) into a [`SuggestionBatch`]. Every entry
//! point shares one pipeline: compose prompt, fingerprint, cache lookup,
//! in-flight dedup, rate limit, provider call, parse, cache store. Failures
//! never escape as errors; they come back as batches with `error` set.

pub mod cache;
pub mod fingerprint;
pub mod parse;
pub mod prompt;
pub mod rate_limit;

pub use cache::SuggestionCache;
pub use fingerprint::{Fingerprint, RequestKind};
pub use parse::parse_response;
pub use rate_limit::RateLimiter;

use crate::command::CommandTable;
use crate::context::Context;
use crate::error::{ConfigError, ErrorKind};
use crate::provider::{ProviderConfig, ProviderFactory, SuggestionProvider};
use crate::rules::RuleEngine;
use crate::types::SuggestionBatch;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Runtime knobs for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub min_interval: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub commands: CommandTable,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: Duration::from_secs(300),
            min_interval: Duration::from_secs(1),
            max_tokens: 1000,
            temperature: 0.7,
            commands: CommandTable::default(),
        }
    }
}

/// Counters exposed through [`SuggestionOrchestrator::stats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorStats {
    pub provider_calls: u64,
    pub cache_hits: u64,
    pub dedup_joins: u64,
    pub failures: u64,
    pub cache_entries: usize,
}

#[derive(Default)]
struct Counters {
    provider_calls: AtomicU64,
    cache_hits: AtomicU64,
    dedup_joins: AtomicU64,
    failures: AtomicU64,
}

type Waiters = Vec<oneshot::Sender<SuggestionBatch>>;

struct Inner {
    provider: Option<Arc<dyn SuggestionProvider>>,
    init_error: Option<String>,
    settings: OrchestratorSettings,
    cache: Mutex<SuggestionCache>,
    rate_limiter: RateLimiter,
    inflight: Mutex<HashMap<Fingerprint, Waiters>>,
    counters: Counters,
    rules: RuleEngine,
}

/// Cheap to clone; clones share cache, limiter and in-flight table.
#[derive(Clone)]
pub struct SuggestionOrchestrator {
    inner: Arc<Inner>,
}

impl SuggestionOrchestrator {
    pub fn new(provider: Arc<dyn SuggestionProvider>, settings: OrchestratorSettings) -> Self {
        info!(
            provider = provider.provider_name(),
            model = provider.model_name(),
            cache_enabled = settings.cache_enabled,
            "Suggestion orchestrator initialized"
        );
        Self::build(Some(provider), None, settings)
    }

    /// Orchestrator that answers every provider-backed call with
    /// [`ErrorKind::Uninitialized`]. Local rule suggestions still work.
    pub fn uninitialized(reason: impl Into<String>, settings: OrchestratorSettings) -> Self {
        let reason = reason.into();
        warn!(reason = %reason, "Suggestion orchestrator running uninitialized");
        Self::build(None, Some(reason), settings)
    }

    /// Build from provider configuration. Missing credentials leave the
    /// orchestrator uninitialized; any other configuration error is fatal.
    pub fn from_config(
        provider: &ProviderConfig,
        settings: OrchestratorSettings,
    ) -> Result<Self, ConfigError> {
        match ProviderFactory::create(provider) {
            Ok(client) => Ok(Self::new(client, settings)),
            Err(ConfigError::MissingCredentials(msg)) => Ok(Self::uninitialized(msg, settings)),
            Err(e) => Err(e),
        }
    }

    fn build(
        provider: Option<Arc<dyn SuggestionProvider>>,
        init_error: Option<String>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                init_error,
                cache: Mutex::new(SuggestionCache::new(settings.cache_ttl)),
                rate_limiter: RateLimiter::new(settings.min_interval),
                inflight: Mutex::new(HashMap::new()),
                counters: Counters::default(),
                rules: RuleEngine::builtin(),
                settings,
            }),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.provider.is_some()
    }

    pub fn provider_name(&self) -> Option<&str> {
        self.inner.provider.as_ref().map(|p| p.provider_name())
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.inner.settings
    }

    /// Suggestions for a context snapshot, optionally steered by a voice
    /// command keyword and free-form query.
    pub async fn generate(
        &self,
        context: &Context,
        command: Option<&str>,
        query: Option<&str>,
    ) -> SuggestionBatch {
        let prompt = prompt::context_prompt(context, command, query, &self.inner.settings.commands);
        self.dispatch(RequestKind::Suggestions, prompt).await
    }

    /// Fixes for the given error indicators.
    pub async fn suggest_fixes<S: AsRef<str>>(
        &self,
        error_indicators: &[S],
        code_context: Option<&str>,
    ) -> SuggestionBatch {
        let message = error_indicators
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(", ");
        let prompt = prompt::fixes_prompt(&message, code_context);
        self.dispatch(RequestKind::Fixes, prompt).await
    }

    pub async fn analyze_code_quality(&self, code: &str, language: Option<&str>) -> SuggestionBatch {
        let prompt = prompt::quality_prompt(code, language);
        self.dispatch(RequestKind::CodeQuality, prompt).await
    }

    pub async fn generate_documentation(
        &self,
        code: &str,
        language: Option<&str>,
    ) -> SuggestionBatch {
        let prompt = prompt::documentation_prompt(code, language);
        self.dispatch(RequestKind::Documentation, prompt).await
    }

    /// Rule-based suggestions computed locally, without a provider.
    pub fn local_suggestions(&self, context: &Context) -> SuggestionBatch {
        let suggestions = self.inner.rules.evaluate_context(context);
        let summary = match (&context.language, suggestions.len()) {
            (_, 0) => "No local suggestions".to_string(),
            (Some(language), n) => format!("{} local suggestion(s) for {}", n, language),
            (None, n) => format!("{} local suggestion(s)", n),
        };
        SuggestionBatch::new(suggestions, summary, parse::DEFAULT_CONFIDENCE)
    }

    pub fn clear_cache(&self) {
        self.inner.cache.lock().clear();
        info!("Suggestion cache cleared");
    }

    pub fn stats(&self) -> OrchestratorStats {
        let counters = &self.inner.counters;
        OrchestratorStats {
            provider_calls: counters.provider_calls.load(Ordering::Relaxed),
            cache_hits: counters.cache_hits.load(Ordering::Relaxed),
            dedup_joins: counters.dedup_joins.load(Ordering::Relaxed),
            failures: counters.failures.load(Ordering::Relaxed),
            cache_entries: self.inner.cache.lock().len(),
        }
    }

    async fn dispatch(&self, kind: RequestKind, prompt: String) -> SuggestionBatch {
        let Some(provider) = self.inner.provider.clone() else {
            let reason = self
                .inner
                .init_error
                .clone()
                .unwrap_or_else(|| "suggestion provider not initialized".to_string());
            return SuggestionBatch::failed(ErrorKind::Uninitialized, reason);
        };

        let fingerprint = Fingerprint::compute(kind, &prompt);

        let rx = {
            // Cache is re-checked under the in-flight lock: a finishing call
            // stores its batch before it leaves the in-flight table.
            let mut inflight = self.inner.inflight.lock();

            if let Some(batch) = self.cached(&fingerprint) {
                self.inner.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint = %fingerprint.short(), kind = kind.as_str(), "Cache hit");
                return batch;
            }

            let (tx, rx) = oneshot::channel();
            if let Some(waiters) = inflight.get_mut(&fingerprint) {
                waiters.push(tx);
                self.inner.counters.dedup_joins.fetch_add(1, Ordering::Relaxed);
                debug!(fingerprint = %fingerprint.short(), "Joined in-flight request");
            } else {
                inflight.insert(fingerprint, vec![tx]);
                let inner = Arc::clone(&self.inner);
                tokio::spawn(async move {
                    Self::execute(inner, provider, kind, fingerprint, prompt).await;
                });
            }
            rx
        };

        rx.await.unwrap_or_else(|_| {
            SuggestionBatch::failed(ErrorKind::Cancelled, "suggestion request was abandoned")
        })
    }

    fn cached(&self, fingerprint: &Fingerprint) -> Option<SuggestionBatch> {
        if !self.inner.settings.cache_enabled {
            return None;
        }
        self.inner.cache.lock().get(fingerprint)
    }

    /// Runs on its own task so the result reaches every waiter even if the
    /// caller that started it goes away.
    async fn execute(
        inner: Arc<Inner>,
        provider: Arc<dyn SuggestionProvider>,
        kind: RequestKind,
        fingerprint: Fingerprint,
        prompt: String,
    ) {
        let entry = InflightEntry {
            inner: Arc::clone(&inner),
            fingerprint,
            resolved: false,
        };
        inner.rate_limiter.acquire().await;
        inner.counters.provider_calls.fetch_add(1, Ordering::Relaxed);

        let started = tokio::time::Instant::now();
        let result = provider
            .generate(&prompt, inner.settings.max_tokens, inner.settings.temperature)
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let batch = match result {
            Ok(raw) => {
                let batch = parse_response(&raw);
                info!(
                    fingerprint = %fingerprint.short(),
                    kind = kind.as_str(),
                    provider = provider.provider_name(),
                    suggestions = batch.len(),
                    duration_ms,
                    "Provider call completed"
                );
                if inner.settings.cache_enabled {
                    inner.cache.lock().insert(fingerprint, batch.clone());
                }
                batch
            }
            Err(err) => {
                inner.counters.failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    fingerprint = %fingerprint.short(),
                    kind = kind.as_str(),
                    provider = provider.provider_name(),
                    error_kind = %err.kind(),
                    error = %err,
                    duration_ms,
                    "Provider call failed"
                );
                SuggestionBatch::failed(err.kind(), err.to_string())
            }
        };

        entry.resolve(batch);
    }
}

/// Owns one in-flight table entry for the lifetime of an `execute` task.
///
/// If the task ends without resolving (a panicking provider), dropping the
/// entry removes it and its senders, so waiters wake with a cancelled batch
/// and the next caller starts a fresh call.
struct InflightEntry {
    inner: Arc<Inner>,
    fingerprint: Fingerprint,
    resolved: bool,
}

impl InflightEntry {
    fn resolve(mut self, batch: SuggestionBatch) {
        self.resolved = true;
        let waiters = self
            .inner
            .inflight
            .lock()
            .remove(&self.fingerprint)
            .unwrap_or_default();
        for tx in waiters {
            let _ = tx.send(batch.clone());
        }
    }
}

impl Drop for InflightEntry {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        if let Some(waiters) = self.inner.inflight.lock().remove(&self.fingerprint) {
            warn!(
                fingerprint = %self.fingerprint.short(),
                waiters = waiters.len(),
                "In-flight request ended without a result"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::ScriptedProvider;
    use crate::types::SuggestionType;

    const STRUCTURED: &str = r#"{"suggestions":[{"type":"code_fix","title":"Fix X","description":"d","code":"","priority":"high"}],"summary":"s","confidence":0.9}"#;

    fn settings() -> OrchestratorSettings {
        OrchestratorSettings {
            min_interval: Duration::ZERO,
            ..OrchestratorSettings::default()
        }
    }

    fn python_context() -> Context {
        Context::for_code("python", vec!["def compute(x) return x".to_string()])
    }

    #[tokio::test]
    async fn test_uninitialized_short_circuits() {
        let orchestrator = SuggestionOrchestrator::uninitialized("no api key", settings());
        let batch = orchestrator.generate(&python_context(), None, None).await;
        assert_eq!(batch.error, Some(ErrorKind::Uninitialized));
        assert!(batch.is_empty());
        assert_eq!(batch.summary, "no api key");
        assert!(!orchestrator.is_initialized());
        assert_eq!(orchestrator.stats().provider_calls, 0);
    }

    #[tokio::test]
    async fn test_structured_batch_round_trip() {
        let provider = Arc::new(ScriptedProvider::new(vec![STRUCTURED.to_string()]));
        let orchestrator = SuggestionOrchestrator::new(provider.clone(), settings());
        let batch = orchestrator.generate(&python_context(), None, None).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.suggestions[0].kind, SuggestionType::CodeFix);
        assert_eq!(batch.confidence, 0.9);
        assert!(provider.last_prompt().unwrap().contains("Language: python"));
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let provider = Arc::new(ScriptedProvider::always(Ok(STRUCTURED.to_string())));
        let orchestrator = SuggestionOrchestrator::new(provider.clone(), settings());
        let context = python_context();

        let first = orchestrator.generate(&context, Some("fix"), None).await;
        let second = orchestrator.generate(&context, Some("fix"), None).await;
        assert_eq!(first, second);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(orchestrator.stats().cache_hits, 1);

        orchestrator.clear_cache();
        orchestrator.generate(&context, Some("fix"), None).await;
        assert_eq!(provider.call_count(), 2);
    }

    /// Panics on its first call, then answers normally.
    struct PanicsOnce {
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl SuggestionProvider for PanicsOnce {
        async fn generate(
            &self,
            _prompt: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String, ProviderError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("provider blew up");
            }
            Ok(STRUCTURED.to_string())
        }

        fn provider_name(&self) -> &str {
            "panics-once"
        }

        fn model_name(&self) -> &str {
            "test"
        }
    }

    #[tokio::test]
    async fn test_panicking_provider_does_not_strand_later_callers() {
        let provider = Arc::new(PanicsOnce {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let orchestrator = SuggestionOrchestrator::new(provider.clone(), settings());
        let context = python_context();

        let first = orchestrator.generate(&context, None, None).await;
        assert_eq!(first.error, Some(ErrorKind::Cancelled));
        assert!(first.is_empty());

        let second = tokio::time::timeout(
            Duration::from_secs(5),
            orchestrator.generate(&context, None, None),
        )
        .await
        .expect("second request should not hang on the abandoned entry");
        assert!(!second.is_error());
        assert_eq!(second.len(), 1);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(orchestrator.stats().provider_calls, 2);
    }

    #[tokio::test]
    async fn test_cache_disabled_always_calls_provider() {
        let provider = Arc::new(ScriptedProvider::always(Ok(STRUCTURED.to_string())));
        let orchestrator = SuggestionOrchestrator::new(
            provider.clone(),
            OrchestratorSettings {
                cache_enabled: false,
                ..settings()
            },
        );
        let context = python_context();
        orchestrator.generate(&context, None, None).await;
        orchestrator.generate(&context, None, None).await;
        assert_eq!(provider.call_count(), 2);
        assert_eq!(orchestrator.stats().cache_entries, 0);
    }

    #[tokio::test]
    async fn test_provider_errors_are_not_cached() {
        let provider = Arc::new(ScriptedProvider::with_results(vec![
            Err(ProviderError::RateLimit("slow down".into())),
            Ok(STRUCTURED.to_string()),
        ]));
        let orchestrator = SuggestionOrchestrator::new(provider.clone(), settings());
        let context = python_context();

        let failed = orchestrator.generate(&context, None, None).await;
        assert_eq!(failed.error, Some(ErrorKind::RateLimit));
        assert!(failed.is_empty());

        let ok = orchestrator.generate(&context, None, None).await;
        assert!(!ok.is_error());
        assert_eq!(provider.call_count(), 2);
        assert_eq!(orchestrator.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_template_operations_use_own_prompts() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            r#"{"fixes":[{"description":"Add colon","code":"def f():"}],"prevention":"lint"}"#
                .to_string(),
            r#"{"issues":[],"score":0.8,"improvements":[]}"#.to_string(),
            r#"{"description":"Adds","returns":"sum"}"#.to_string(),
        ]));
        let orchestrator = SuggestionOrchestrator::new(provider.clone(), settings());

        let fixes = orchestrator
            .suggest_fixes(&["Syntax Error"], Some("def f()"))
            .await;
        assert_eq!(fixes.suggestions[0].kind, SuggestionType::CodeFix);
        assert!(provider.last_prompt().unwrap().contains("Error: Syntax Error"));

        let quality = orchestrator.analyze_code_quality("x=1", Some("python")).await;
        assert!(quality.is_empty());
        assert_eq!(quality.confidence, 0.8);

        let docs = orchestrator.generate_documentation("fn add() {}", Some("rust")).await;
        assert_eq!(docs.suggestions[0].kind, SuggestionType::Documentation);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_local_suggestions_work_uninitialized() {
        let orchestrator = SuggestionOrchestrator::uninitialized("offline", settings());
        let context = Context {
            text_content: "def greet(name)\n    print(name)\n".to_string(),
            ..Context::for_code("python", vec![])
        };
        let batch = orchestrator.local_suggestions(&context);
        assert!(!batch.is_error());
        assert!(batch.suggestions.iter().any(|s| s.title == "Missing Colon"));
    }

    #[test]
    fn test_from_config_invalid_is_fatal() {
        let provider = ProviderConfig {
            model: String::new(),
            ..ProviderConfig::default()
        };
        assert!(SuggestionOrchestrator::from_config(&provider, settings()).is_err());
    }
}
