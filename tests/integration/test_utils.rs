//! Shared test utilities for integration tests
//!
//! Environment isolation for configuration tests, plus the fakes used to run
//! a whole assistant without a screen, microphone, keyboard or network.

use async_trait::async_trait;
use sidekick::assistant::{AudioInput, Collaborators};
use sidekick::console::ConsoleSpeech;
use sidekick::error::SensorError;
use sidekick::orchestrator::{OrchestratorSettings, SuggestionOrchestrator};
use sidekick::presentation::RecordingGateway;
use sidekick::provider::ScriptedProvider;
use sidekick::sensor::{ChannelHotkeyBackend, Chord, TextExtractor};
use sidekick::types::UiEvent;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Variables a test may set; all are restored afterwards.
const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "XDG_DATA_HOME",
    "SIDEKICK_ENV",
    "SIDEKICK__ORCHESTRATOR__MAX_TOKENS",
    "SIDEKICK__PROVIDER__MODEL",
];

struct EnvState(Vec<(&'static str, Option<String>)>);

impl EnvState {
    fn capture() -> Self {
        Self(
            ISOLATED_VARS
                .iter()
                .map(|name| (*name, std::env::var(name).ok()))
                .collect(),
        )
    }

    fn restore(self) {
        for (name, value) in self.0 {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with XDG directories pointed into `test_dir` and every sidekick
/// variable cleared. The original environment is restored afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_config_home = test_dir.path().to_path_buf();
    let test_data_home = test_dir.path().join("data");
    let test_home = test_dir.path().join("home");

    std::fs::create_dir_all(&test_data_home).unwrap();
    std::fs::create_dir_all(&test_home).unwrap();

    for name in ISOLATED_VARS {
        std::env::remove_var(name);
    }
    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_config_home.to_str().unwrap());
    std::env::set_var("XDG_DATA_HOME", test_data_home.to_str().unwrap());

    let result = f();

    env_state.restore();

    result
}

pub const OPTIMIZE_RESPONSE: &str = r#"{"suggestions":[{"type":"optimization","title":"Use a comprehension","description":"Build the list in one expression","code":"[x * 2 for x in items]","priority":"medium"}],"summary":"One optimization","confidence":0.8}"#;

pub const PYTHON_SCREEN: &str = "import os\ndef greet(name)\n    print(name)\n";

/// Orchestrator settings without call spacing, so tests only wait on what
/// they exercise.
pub fn fast_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        min_interval: Duration::ZERO,
        ..OrchestratorSettings::default()
    }
}

/// Screen text source returning a fixed string.
pub struct FixedScreen(pub String);

#[async_trait]
impl TextExtractor for FixedScreen {
    async fn extract_text(&self) -> Result<String, SensorError> {
        Ok(self.0.clone())
    }
}

/// Handles for driving a running assistant from a test.
pub struct Rig {
    pub gateway: Arc<RecordingGateway>,
    pub utterances: mpsc::Sender<String>,
    pub chords: mpsc::Sender<Chord>,
    pub ui_events: mpsc::Sender<UiEvent>,
}

/// Collaborators backed by channels and a recording gateway.
pub fn rig(screen_text: &str) -> (Rig, Collaborators) {
    let gateway = Arc::new(RecordingGateway::new());
    let (utterances, utterance_rx) = mpsc::channel(8);
    let (chords, chord_rx) = mpsc::channel(8);
    let (ui_events, ui_rx) = mpsc::channel(8);

    let speech = Arc::new(ConsoleSpeech::new(utterance_rx));
    let collaborators = Collaborators {
        screen: Arc::new(FixedScreen(screen_text.to_string())),
        audio: Some(AudioInput {
            capture: speech.clone(),
            recognizer: speech,
        }),
        hotkeys: Some(Box::new(ChannelHotkeyBackend::new(chord_rx))),
        gateway: gateway.clone(),
        ui_events: ui_rx,
    };

    (
        Rig {
            gateway,
            utterances,
            chords,
            ui_events,
        },
        collaborators,
    )
}

pub fn scripted_orchestrator(provider: Arc<ScriptedProvider>) -> SuggestionOrchestrator {
    SuggestionOrchestrator::new(provider, fast_settings())
}
