//! Presentation gateway contract.
//!
//! The core never renders anything. It calls `show`, `update` and `hide` on a
//! gateway, and the gateway reports clicks and closes back as [`UiEvent`]s on
//! a channel handed to it at construction.
//!
//! [`UiEvent`]: crate::types::UiEvent

use crate::types::SuggestionBatch;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// Display surface for suggestion batches.
///
/// Calls must not block and must be idempotent: hiding a hidden surface or
/// showing the same batch twice is harmless.
pub trait PresentationGateway: Send + Sync {
    fn show(&self, batch: &SuggestionBatch);

    fn update(&self, batch: &SuggestionBatch);

    fn hide(&self);
}

/// One call received by a [`RecordingGateway`].
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Show(SuggestionBatch),
    Update(SuggestionBatch),
    Hide,
}

/// Gateway that records every call; used by tests and headless runs.
pub struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    visible: Mutex<bool>,
    count: watch::Sender<usize>,
}

impl Default for RecordingGateway {
    fn default() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            calls: Mutex::new(Vec::new()),
            visible: Mutex::new(false),
            count,
        }
    }
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: GatewayCall) {
        let len = {
            let mut calls = self.calls.lock();
            calls.push(call);
            calls.len()
        };
        self.count.send_replace(len);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.lock()
    }

    /// Most recent batch passed to `show` or `update`.
    pub fn last_displayed(&self) -> Option<SuggestionBatch> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            GatewayCall::Show(batch) | GatewayCall::Update(batch) => Some(batch.clone()),
            GatewayCall::Hide => None,
        })
    }

    /// Wait until at least `n` calls have been recorded or `timeout` passes.
    /// Returns whether the count was reached.
    pub async fn wait_for_calls(&self, n: usize, timeout: Duration) -> bool {
        let mut rx = self.count.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|count| *count >= n))
            .await
            .map(|result| result.is_ok())
            .unwrap_or(false)
    }
}

impl PresentationGateway for RecordingGateway {
    fn show(&self, batch: &SuggestionBatch) {
        *self.visible.lock() = true;
        self.record(GatewayCall::Show(batch.clone()));
    }

    fn update(&self, batch: &SuggestionBatch) {
        self.record(GatewayCall::Update(batch.clone()));
    }

    fn hide(&self) {
        *self.visible.lock() = false;
        self.record(GatewayCall::Hide);
    }
}
