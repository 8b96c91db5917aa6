//! Activation machine properties over arbitrary input sequences.

use proptest::prelude::*;
use sidekick::activation::{ActivationMachine, ActivationState, ControlInput, Effect};
use sidekick::error::ErrorKind;
use sidekick::types::{
    HotkeyAction, Priority, SensorEvent, Suggestion, SuggestionBatch, SuggestionType, UiEvent,
};

fn input(choice: u8) -> ControlInput {
    match choice % 10 {
        0 => ControlInput::Sensor(SensorEvent::HotwordDetected),
        1 => ControlInput::Sensor(SensorEvent::HotkeyPressed {
            action: HotkeyAction::Activate,
        }),
        2 => ControlInput::Sensor(SensorEvent::HotkeyPressed {
            action: HotkeyAction::Deactivate,
        }),
        3 => ControlInput::Sensor(SensorEvent::HotkeyPressed {
            action: HotkeyAction::Toggle,
        }),
        4 => ControlInput::Sensor(SensorEvent::VoiceCommand {
            command: "fix".to_string(),
            text: "fix this".to_string(),
        }),
        5 => ControlInput::Ui(UiEvent::Closed),
        6 => ControlInput::AutoHide,
        7 => ControlInput::Published(SuggestionBatch::new(
            vec![Suggestion::new(
                SuggestionType::CodeFix,
                "Add colon",
                "",
                Priority::High,
            )],
            "fix",
            0.9,
        )),
        8 => ControlInput::Published(SuggestionBatch::failed(ErrorKind::Network, "down")),
        _ => ControlInput::Published(SuggestionBatch::new(Vec::new(), "", 0.5)),
    }
}

#[test]
fn test_visibility_tracks_activation() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&prop::collection::vec(any::<u8>(), 0..64), |choices| {
            let mut machine = ActivationMachine::default();
            let mut visible = false;

            for choice in choices {
                let before = machine.state();
                let effects = machine.apply(input(choice));
                let after = machine.state();

                for effect in &effects {
                    match effect {
                        Effect::Show(batch) => {
                            prop_assert_eq!(before, ActivationState::Idle);
                            prop_assert!(!batch.is_empty());
                            visible = true;
                        }
                        Effect::Hide => {
                            prop_assert_eq!(before, ActivationState::Active);
                            visible = false;
                        }
                        Effect::Update(batch) => {
                            prop_assert_eq!(after, ActivationState::Active);
                            prop_assert!(!batch.is_error());
                            prop_assert!(!batch.is_empty());
                        }
                        Effect::Forward { .. } => {
                            prop_assert_eq!(before, ActivationState::Active);
                        }
                        Effect::Clicked(_) => {}
                    }
                }

                if before == after {
                    prop_assert!(!effects
                        .iter()
                        .any(|e| matches!(e, Effect::Show(_) | Effect::Hide)));
                }
                prop_assert_eq!(visible, after == ActivationState::Active);
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_last_suggestions_are_never_failures() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&prop::collection::vec(any::<u8>(), 0..64), |choices| {
            let mut machine = ActivationMachine::default();
            for choice in choices {
                machine.apply(input(choice));
                if let Some(batch) = machine.last_suggestions() {
                    prop_assert!(!batch.is_error());
                    prop_assert!(!batch.is_empty());
                }
            }
            Ok(())
        })
        .unwrap();
}
