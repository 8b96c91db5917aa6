//! Scripted provider for tests and offline demos.

use super::SuggestionProvider;
use crate::error::ProviderError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// One recorded `generate` call.
#[derive(Debug, Clone)]
pub struct ProviderCall {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Tokio clock instant at which the call started
    pub at: Instant,
}

/// Returns queued results in order, then a fixed fallback.
///
/// Every call is recorded so tests can assert on call counts, prompts and
/// spacing between calls.
pub struct ScriptedProvider {
    queue: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback: Result<String, ProviderError>,
    delay: Duration,
    calls: Mutex<Vec<ProviderCall>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(results: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            queue: Mutex::new(results.into()),
            fallback: Ok("Mock response".to_string()),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider that answers every call with the same result.
    pub fn always(result: Result<String, ProviderError>) -> Self {
        let mut provider = Self::with_results(Vec::new());
        provider.fallback = result;
        provider
    }

    /// Simulated latency applied to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.calls.lock().last().map(|call| call.prompt.clone())
    }
}

#[async_trait]
impl SuggestionProvider for ScriptedProvider {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        self.calls.lock().push(ProviderCall {
            prompt: prompt.to_string(),
            max_tokens,
            temperature,
            at: Instant::now(),
        });

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.queue.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
