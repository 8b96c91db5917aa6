//! Suggestion loop: the only task that calls the orchestrator at runtime.
//!
//! Requests come from three places: voice commands forwarded by the
//! controller, context updates that carry error indicators, and a periodic
//! tick. All of them are ignored unless the assistant is active, and a result
//! that arrives after deactivation is dropped.

use crate::activation::{ActivationState, VoiceRequest};
use crate::context::{Context, ContextStore};
use crate::orchestrator::SuggestionOrchestrator;
use crate::types::SuggestionBatch;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Characters of recent screen text sent along with fix requests.
const FIX_CONTEXT_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Trigger {
    Voice(VoiceRequest),
    Errors,
    Tick,
}

impl Trigger {
    fn as_str(&self) -> &'static str {
        match self {
            Trigger::Voice(_) => "voice",
            Trigger::Errors => "errors",
            Trigger::Tick => "tick",
        }
    }
}

pub struct SuggestionLoop {
    orchestrator: SuggestionOrchestrator,
    store: Arc<ContextStore>,
    versions: watch::Receiver<u64>,
    state: watch::Receiver<ActivationState>,
    voice_requests: mpsc::Receiver<VoiceRequest>,
    published: mpsc::Sender<SuggestionBatch>,
    interval: Duration,
    last_batch_size: Arc<AtomicUsize>,
}

impl SuggestionLoop {
    pub fn new(
        orchestrator: SuggestionOrchestrator,
        store: Arc<ContextStore>,
        state: watch::Receiver<ActivationState>,
        voice_requests: mpsc::Receiver<VoiceRequest>,
        published: mpsc::Sender<SuggestionBatch>,
        interval: Duration,
    ) -> Self {
        // Subscribed here so replaces made before `run` is polled are not lost.
        let mut versions = store.subscribe();
        if store.has_capture() {
            versions.mark_changed();
        }
        Self {
            orchestrator,
            store,
            versions,
            state,
            voice_requests,
            published,
            interval: interval.max(Duration::from_millis(100)),
            last_batch_size: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter holding the size of the last published batch.
    pub fn last_batch_size(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.last_batch_size)
    }

    fn is_active(&self) -> bool {
        *self.state.borrow() == ActivationState::Active
    }

    async fn request(&self, trigger: &Trigger, context: &Context) -> SuggestionBatch {
        if !self.orchestrator.is_initialized() {
            return self.orchestrator.local_suggestions(context);
        }
        match trigger {
            Trigger::Voice(request) => {
                self.orchestrator
                    .generate(context, Some(&request.command), Some(&request.text))
                    .await
            }
            Trigger::Errors => {
                let indicators: Vec<&str> = context.error_indicators.iter().map(String::as_str).collect();
                self.orchestrator
                    .suggest_fixes(&indicators, Some(context.recent_text(FIX_CONTEXT_CHARS)))
                    .await
            }
            Trigger::Tick => self.orchestrator.generate(context, None, None).await,
        }
    }

    /// Returns `false` when the loop should stop.
    async fn handle(&self, trigger: Trigger, cancel: &CancellationToken) -> bool {
        if !self.is_active() {
            debug!(trigger = trigger.as_str(), "Inactive, skipping suggestion request");
            return true;
        }
        if matches!(trigger, Trigger::Tick) && !self.store.has_capture() {
            return true;
        }

        let context = self.store.snapshot();
        let batch = tokio::select! {
            _ = cancel.cancelled() => return false,
            batch = self.request(&trigger, &context) => batch,
        };

        if let Some(kind) = batch.error {
            warn!(trigger = trigger.as_str(), error_kind = %kind, summary = %batch.summary, "Suggestion request failed");
            return true;
        }
        if batch.is_empty() {
            debug!(trigger = trigger.as_str(), "No suggestions produced");
            return true;
        }
        if !self.is_active() {
            debug!(trigger = trigger.as_str(), "Deactivated while waiting, discarding suggestions");
            return true;
        }

        info!(trigger = trigger.as_str(), suggestions = batch.len(), "Publishing suggestions");
        self.last_batch_size.store(batch.len(), Ordering::Relaxed);
        self.published.send(batch).await.is_ok()
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "Suggestion loop started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let mut context_open = true;
        loop {
            let trigger = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                request = self.voice_requests.recv() => match request {
                    Some(request) => Trigger::Voice(request),
                    None => break,
                },
                changed = self.versions.changed(), if context_open => match changed {
                    Ok(()) if self.store.snapshot().has_errors() => Trigger::Errors,
                    Ok(()) => continue,
                    Err(_) => {
                        context_open = false;
                        continue;
                    }
                },
                _ = ticker.tick() => Trigger::Tick,
            };

            if !self.handle(trigger, &cancel).await {
                break;
            }
        }
        info!("Suggestion loop stopped");
    }
}
