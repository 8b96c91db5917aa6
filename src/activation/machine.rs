//! Pure activation state machine.

use crate::types::{HotkeyAction, Priority, SensorEvent, Suggestion, SuggestionBatch, SuggestionType, UiEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationState {
    #[default]
    Idle,
    Active,
}

impl fmt::Display for ActivationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationState::Idle => f.write_str("idle"),
            ActivationState::Active => f.write_str("active"),
        }
    }
}

/// Everything the controller feeds into the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlInput {
    Sensor(SensorEvent),
    Ui(UiEvent),
    /// A batch produced by the suggestion loop
    Published(SuggestionBatch),
    /// The auto-hide deadline passed without a new display
    AutoHide,
}

/// Side effects requested by a transition, executed in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Show(SuggestionBatch),
    Update(SuggestionBatch),
    Hide,
    /// Voice command to hand to the orchestrator
    Forward { command: String, text: String },
    /// The user picked a suggestion on the display surface
    Clicked(Suggestion),
}

/// Batch shown on activation before any suggestions exist.
pub fn welcome_batch() -> SuggestionBatch {
    SuggestionBatch::new(
        vec![
            Suggestion::new(
                SuggestionType::General,
                "Welcome to AI Copilot!",
                "I'm here to help you with your coding. Say 'Hey Copilot' or use keyboard shortcuts to get started.",
                Priority::Low,
            ),
            Suggestion::new(
                SuggestionType::BestPractice,
                "Available Commands",
                "Try saying: explain, fix, optimize, document, test, refactor, or debug",
                Priority::Low,
            ),
        ],
        "Welcome",
        1.0,
    )
}

/// Activation state plus the last displayable batch.
///
/// Toggle is resolved against activation: it activates when idle and
/// deactivates when active, so visibility and activation never diverge.
#[derive(Debug, Clone)]
pub struct ActivationMachine {
    state: ActivationState,
    last: Option<SuggestionBatch>,
    welcome: SuggestionBatch,
}

impl Default for ActivationMachine {
    fn default() -> Self {
        Self::new(welcome_batch())
    }
}

impl ActivationMachine {
    pub fn new(welcome: SuggestionBatch) -> Self {
        Self {
            state: ActivationState::Idle,
            last: None,
            welcome,
        }
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn last_suggestions(&self) -> Option<&SuggestionBatch> {
        self.last.as_ref()
    }

    /// Apply one input and return the effects to carry out.
    pub fn apply(&mut self, input: ControlInput) -> Vec<Effect> {
        match input {
            ControlInput::Sensor(SensorEvent::HotwordDetected)
            | ControlInput::Sensor(SensorEvent::HotkeyPressed {
                action: HotkeyAction::Activate,
            }) => self.activate(),
            ControlInput::Sensor(SensorEvent::HotkeyPressed {
                action: HotkeyAction::Deactivate,
            }) => self.deactivate(),
            ControlInput::Sensor(SensorEvent::HotkeyPressed {
                action: HotkeyAction::Toggle,
            }) => match self.state {
                ActivationState::Idle => self.activate(),
                ActivationState::Active => self.deactivate(),
            },
            ControlInput::Sensor(SensorEvent::VoiceCommand { command, text }) => {
                match self.state {
                    ActivationState::Active => vec![Effect::Forward { command, text }],
                    ActivationState::Idle => Vec::new(),
                }
            }
            ControlInput::Ui(UiEvent::Closed) | ControlInput::AutoHide => self.deactivate(),
            ControlInput::Ui(UiEvent::SuggestionClicked(suggestion)) => {
                vec![Effect::Clicked(suggestion)]
            }
            ControlInput::Published(batch) => self.publish(batch),
        }
    }

    fn activate(&mut self) -> Vec<Effect> {
        if self.state == ActivationState::Active {
            return Vec::new();
        }
        self.state = ActivationState::Active;
        let batch = self.last.clone().unwrap_or_else(|| self.welcome.clone());
        vec![Effect::Show(batch)]
    }

    fn deactivate(&mut self) -> Vec<Effect> {
        if self.state == ActivationState::Idle {
            return Vec::new();
        }
        self.state = ActivationState::Idle;
        vec![Effect::Hide]
    }

    fn publish(&mut self, batch: SuggestionBatch) -> Vec<Effect> {
        // Failed or empty batches never replace what the user can see.
        if batch.is_error() || batch.is_empty() {
            return Vec::new();
        }
        // A repeat of what is already on screen is not a new display.
        if self.last.as_ref() == Some(&batch) {
            return Vec::new();
        }
        self.last = Some(batch.clone());
        match self.state {
            ActivationState::Active => vec![Effect::Update(batch)],
            ActivationState::Idle => Vec::new(),
        }
    }
}
