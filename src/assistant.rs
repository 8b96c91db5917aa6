//! Application context
//!
//! [`Assistant`] owns every long-lived component and the tasks that drive
//! them. There is no global instance: callers build one from configuration
//! plus the boundary collaborators (screen text source, microphone, hotkey
//! backend, display surface) and shut it down explicitly.

pub mod shutdown;
pub mod suggestion_loop;

pub use shutdown::{ShutdownCoordinator, Stage, DEFAULT_STAGE_TIMEOUT};
pub use suggestion_loop::SuggestionLoop;

use crate::activation::{ActivationController, ActivationState, ControllerChannels};
use crate::config::AssistantConfig;
use crate::context::ContextStore;
use crate::error::ConfigError;
use crate::orchestrator::{OrchestratorStats, SuggestionOrchestrator};
use crate::presentation::PresentationGateway;
use crate::sensor::{
    AudioCapture, AudioSensor, HotkeyBackend, HotkeySensor, ScreenSensor, SpeechRecognizer,
    TextExtractor, SENSOR_CHANNEL_CAPACITY,
};
use crate::types::UiEvent;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::info;

const VOICE_QUEUE_CAPACITY: usize = 8;
const PUBLISH_QUEUE_CAPACITY: usize = 8;

/// Microphone and speech-to-text pair.
pub struct AudioInput {
    pub capture: Arc<dyn AudioCapture>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
}

/// Boundary collaborators supplied by the embedding application.
pub struct Collaborators {
    pub screen: Arc<dyn TextExtractor>,
    pub audio: Option<AudioInput>,
    pub hotkeys: Option<Box<dyn HotkeyBackend>>,
    pub gateway: Arc<dyn PresentationGateway>,
    /// Clicks and closes reported by the gateway
    pub ui_events: mpsc::Receiver<UiEvent>,
}

/// Point-in-time view of a running assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantStatus {
    pub state: ActivationState,
    pub context_version: u64,
    pub last_batch_size: usize,
    pub provider: Option<String>,
    pub orchestrator: OrchestratorStats,
}

pub struct Assistant {
    store: Arc<ContextStore>,
    orchestrator: SuggestionOrchestrator,
    state: watch::Receiver<ActivationState>,
    last_batch_size: Arc<AtomicUsize>,
    shutdown: ShutdownCoordinator,
}

impl Assistant {
    /// Build the orchestrator from `config.provider` and start. Missing
    /// credentials leave the orchestrator uninitialized; other configuration
    /// errors are returned.
    pub fn start(config: &AssistantConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        let settings = config.orchestrator.settings(&config.commands);
        let orchestrator = SuggestionOrchestrator::from_config(&config.provider, settings)?;
        Ok(Self::start_with(config, orchestrator, collaborators))
    }

    /// Start with a ready-made orchestrator. Must be called inside a tokio
    /// runtime.
    pub fn start_with(
        config: &AssistantConfig,
        orchestrator: SuggestionOrchestrator,
        collaborators: Collaborators,
    ) -> Self {
        let Collaborators {
            screen,
            audio,
            hotkeys,
            gateway,
            ui_events,
        } = collaborators;

        let mut shutdown = ShutdownCoordinator::new();
        let store = Arc::new(ContextStore::new());
        let (sensor_tx, sensor_rx) = mpsc::channel(SENSOR_CHANNEL_CAPACITY);
        let (voice_tx, voice_rx) = mpsc::channel(VOICE_QUEUE_CAPACITY);
        let (published_tx, published_rx) = mpsc::channel(PUBLISH_QUEUE_CAPACITY);

        let controller =
            ActivationController::new(gateway, voice_tx, config.presentation.auto_hide());
        let state = controller.subscribe();
        let token = shutdown.token(Stage::Presentation);
        shutdown.spawn(
            Stage::Presentation,
            "activation",
            controller.run(
                ControllerChannels {
                    sensor_events: sensor_rx,
                    ui_events,
                    published: published_rx,
                },
                token,
            ),
        );

        let suggestion_loop = SuggestionLoop::new(
            orchestrator.clone(),
            Arc::clone(&store),
            state.clone(),
            voice_rx,
            published_tx,
            config.orchestrator.suggestion_interval(),
        );
        let last_batch_size = suggestion_loop.last_batch_size();
        let token = shutdown.token(Stage::Suggestions);
        shutdown.spawn(Stage::Suggestions, "suggestions", suggestion_loop.run(token));

        let screen_sensor =
            ScreenSensor::new(screen, Arc::clone(&store), config.screen.capture_interval());
        let token = shutdown.token(Stage::Sensors);
        shutdown.spawn(Stage::Sensors, "screen", screen_sensor.run(token));

        match audio {
            Some(input) if config.audio.enabled => {
                let audio_sensor = AudioSensor::new(
                    input.capture,
                    input.recognizer,
                    config.audio.settings(),
                    config.commands.clone(),
                    sensor_tx.clone(),
                );
                let token = shutdown.token(Stage::Sensors);
                shutdown.spawn(Stage::Sensors, "audio", audio_sensor.run(token));
            }
            _ => info!("Audio sensor disabled"),
        }

        match hotkeys {
            Some(backend) if config.hotkeys.enabled => {
                let hotkey_sensor = HotkeySensor::new(backend, config.hotkeys.bindings(), sensor_tx);
                let token = shutdown.token(Stage::Sensors);
                shutdown.spawn(Stage::Sensors, "hotkeys", hotkey_sensor.run(token));
            }
            _ => info!("Hotkey sensor disabled"),
        }

        info!(
            provider = orchestrator.provider_name().unwrap_or("none"),
            initialized = orchestrator.is_initialized(),
            tasks = shutdown.task_count(),
            "Assistant started"
        );

        Self {
            store,
            orchestrator,
            state,
            last_batch_size,
            shutdown,
        }
    }

    pub fn store(&self) -> Arc<ContextStore> {
        Arc::clone(&self.store)
    }

    pub fn orchestrator(&self) -> &SuggestionOrchestrator {
        &self.orchestrator
    }

    pub fn state(&self) -> ActivationState {
        *self.state.borrow()
    }

    /// Receiver that observes activation changes.
    pub fn subscribe_state(&self) -> watch::Receiver<ActivationState> {
        self.state.clone()
    }

    pub fn status(&self) -> AssistantStatus {
        AssistantStatus {
            state: self.state(),
            context_version: self.store.version(),
            last_batch_size: self.last_batch_size.load(Ordering::Relaxed),
            provider: self.orchestrator.provider_name().map(str::to_string),
            orchestrator: self.orchestrator.stats(),
        }
    }

    /// Stop sensors, then the suggestion loop, then presentation.
    pub async fn shutdown(mut self) {
        self.shutdown_with_timeout(DEFAULT_STAGE_TIMEOUT).await;
    }

    pub async fn shutdown_with_timeout(&mut self, stage_timeout: Duration) {
        info!("Assistant shutting down");
        self.shutdown.graceful_shutdown(stage_timeout).await;
    }
}
