//! Activation controller task.

use super::machine::{ActivationMachine, ActivationState, ControlInput, Effect};
use crate::presentation::PresentationGateway;
use crate::types::{SensorEvent, SuggestionBatch, UiEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Voice command forwarded to the suggestion loop while active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceRequest {
    pub command: String,
    pub text: String,
}

/// Inbound channels consumed by the controller.
pub struct ControllerChannels {
    pub sensor_events: mpsc::Receiver<SensorEvent>,
    pub ui_events: mpsc::Receiver<UiEvent>,
    pub published: mpsc::Receiver<SuggestionBatch>,
}

/// Sole owner of the activation state. Processes every input in arrival order
/// and never awaits downstream consumers.
pub struct ActivationController {
    machine: ActivationMachine,
    gateway: Arc<dyn PresentationGateway>,
    state_tx: watch::Sender<ActivationState>,
    voice_requests: mpsc::Sender<VoiceRequest>,
    auto_hide: Option<Duration>,
    hide_at: Option<Instant>,
}

impl ActivationController {
    /// `auto_hide` of `None` or zero disables auto-hide.
    pub fn new(
        gateway: Arc<dyn PresentationGateway>,
        voice_requests: mpsc::Sender<VoiceRequest>,
        auto_hide: Option<Duration>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ActivationState::Idle);
        Self {
            machine: ActivationMachine::default(),
            gateway,
            state_tx,
            voice_requests,
            auto_hide: auto_hide.filter(|d| !d.is_zero()),
            hide_at: None,
        }
    }

    pub fn with_machine(mut self, machine: ActivationMachine) -> Self {
        self.state_tx.send_replace(machine.state());
        self.machine = machine;
        self
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<ActivationState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> ActivationState {
        self.machine.state()
    }

    /// Apply one input and carry out its effects.
    pub fn handle(&mut self, input: ControlInput) {
        let before = self.machine.state();
        let effects = self.machine.apply(input);
        let after = self.machine.state();

        if before != after {
            info!(from = %before, to = %after, "Activation state changed");
            self.state_tx.send_replace(after);
        }

        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::Show(batch) => {
                debug!(suggestions = batch.len(), "Showing suggestions");
                self.gateway.show(&batch);
                self.arm_auto_hide();
            }
            Effect::Update(batch) => {
                debug!(suggestions = batch.len(), "Updating suggestions");
                self.gateway.update(&batch);
                self.arm_auto_hide();
            }
            Effect::Hide => {
                self.gateway.hide();
                self.hide_at = None;
            }
            Effect::Forward { command, text } => {
                let request = VoiceRequest { command, text };
                if let Err(err) = self.voice_requests.try_send(request) {
                    warn!(error = %err, "Dropping voice request, suggestion loop unavailable");
                }
            }
            Effect::Clicked(suggestion) => {
                info!(title = %suggestion.title, kind = %suggestion.kind, "Suggestion clicked");
            }
        }
    }

    fn arm_auto_hide(&mut self) {
        self.hide_at = self.auto_hide.map(|d| Instant::now() + d);
    }

    /// Run until cancelled or every input channel has closed. Hides the
    /// display on the way out.
    pub async fn run(mut self, mut channels: ControllerChannels, cancel: CancellationToken) {
        info!(auto_hide_ms = self.auto_hide.map(|d| d.as_millis() as u64), "Activation controller started");

        let mut sensors_open = true;
        let mut ui_open = true;
        let mut published_open = true;

        while sensors_open || ui_open || published_open {
            let hide_at = self.hide_at;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = channels.sensor_events.recv(), if sensors_open => match event {
                    Some(event) => self.handle(ControlInput::Sensor(event)),
                    None => sensors_open = false,
                },
                event = channels.ui_events.recv(), if ui_open => match event {
                    Some(event) => self.handle(ControlInput::Ui(event)),
                    None => ui_open = false,
                },
                batch = channels.published.recv(), if published_open => match batch {
                    Some(batch) => self.handle(ControlInput::Published(batch)),
                    None => published_open = false,
                },
                _ = sleep_until(hide_at.unwrap_or_else(Instant::now)), if hide_at.is_some() => {
                    info!("Auto-hiding suggestions");
                    self.handle(ControlInput::AutoHide);
                }
            }
        }

        self.gateway.hide();
        self.state_tx.send_replace(ActivationState::Idle);
        info!("Activation controller stopped");
    }
}
