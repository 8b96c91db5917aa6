//! Whole-assistant scenarios: sensors, activation, suggestion loop and
//! presentation wired together through `Assistant::start_with`.

use crate::integration::test_utils::{rig, scripted_orchestrator, OPTIMIZE_RESPONSE, PYTHON_SCREEN};
use sidekick::activation::{welcome_batch, ActivationState};
use sidekick::assistant::Assistant;
use sidekick::config::AssistantConfig;
use sidekick::orchestrator::SuggestionOrchestrator;
use sidekick::presentation::GatewayCall;
use sidekick::provider::ScriptedProvider;
use sidekick::sensor::Chord;
use sidekick::types::{SuggestionType, UiEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Defaults with the periodic tick pushed out of the way.
fn quiet_config() -> AssistantConfig {
    let mut config = AssistantConfig::default();
    config.orchestrator.suggestion_interval_seconds = 600.0;
    config
}

fn shows(calls: &[GatewayCall]) -> usize {
    calls
        .iter()
        .filter(|call| matches!(call, GatewayCall::Show(_)))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_voice_command_reaches_display() {
    let provider = Arc::new(ScriptedProvider::always(Ok(OPTIMIZE_RESPONSE.to_string())));
    let (rig, collaborators) = rig(PYTHON_SCREEN);
    let assistant = Assistant::start_with(
        &quiet_config(),
        scripted_orchestrator(provider.clone()),
        collaborators,
    );

    rig.utterances
        .send("Hey Copilot, optimize this loop".to_string())
        .await
        .unwrap();
    assert!(rig.gateway.wait_for_calls(2, Duration::from_secs(10)).await);

    let calls = rig.gateway.calls();
    assert_eq!(calls[0], GatewayCall::Show(welcome_batch()));
    match &calls[1] {
        GatewayCall::Update(batch) => {
            assert_eq!(batch.suggestions[0].kind, SuggestionType::Optimization);
            assert_eq!(batch.suggestions[0].title, "Use a comprehension");
        }
        other => panic!("expected an update, got {:?}", other),
    }

    let prompt = provider.last_prompt().unwrap();
    assert!(prompt.contains("User query: optimize this loop"));
    assert_eq!(assistant.state(), ActivationState::Active);

    let status = assistant.status();
    assert_eq!(status.state, ActivationState::Active);
    assert_eq!(status.last_batch_size, 1);
    assert_eq!(status.provider.as_deref(), Some("scripted"));
    assert_eq!(status.orchestrator.provider_calls, 1);
    assert!(assistant.store().has_capture());

    assistant.shutdown().await;
    assert_eq!(rig.gateway.calls().last(), Some(&GatewayCall::Hide));
    assert!(!rig.gateway.is_visible());
}

#[tokio::test(start_paused = true)]
async fn test_simultaneous_activations_show_once() {
    let provider = Arc::new(ScriptedProvider::always(Ok(OPTIMIZE_RESPONSE.to_string())));
    let (rig, collaborators) = rig(PYTHON_SCREEN);
    let assistant = Assistant::start_with(
        &quiet_config(),
        scripted_orchestrator(provider.clone()),
        collaborators,
    );

    let (spoken, pressed) = tokio::join!(
        rig.utterances.send("hey copilot".to_string()),
        rig.chords.send(Chord::parse("ctrl+shift+c").unwrap()),
    );
    spoken.unwrap();
    pressed.unwrap();

    assert!(rig.gateway.wait_for_calls(1, Duration::from_secs(5)).await);
    // Give the second activation time to arrive and be ignored.
    tokio::time::sleep(Duration::from_secs(5)).await;

    let calls = rig.gateway.calls();
    assert_eq!(shows(&calls), 1);
    assert_eq!(calls[0], GatewayCall::Show(welcome_batch()));
    assert_eq!(assistant.state(), ActivationState::Active);
    // No command followed the hotword, so nothing reached the provider.
    assert_eq!(provider.call_count(), 0);

    assistant.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_close_then_toggle_restores_last_suggestions() {
    let provider = Arc::new(ScriptedProvider::always(Ok(OPTIMIZE_RESPONSE.to_string())));
    let (rig, collaborators) = rig(PYTHON_SCREEN);
    let assistant = Assistant::start_with(
        &quiet_config(),
        scripted_orchestrator(provider),
        collaborators,
    );
    let mut state = assistant.subscribe_state();

    rig.utterances
        .send("hey copilot optimize".to_string())
        .await
        .unwrap();
    assert!(rig.gateway.wait_for_calls(2, Duration::from_secs(10)).await);
    let shown = rig.gateway.last_displayed().unwrap();

    rig.ui_events.send(UiEvent::Closed).await.unwrap();
    state
        .wait_for(|s| *s == ActivationState::Idle)
        .await
        .unwrap();
    assert_eq!(rig.gateway.calls()[2], GatewayCall::Hide);

    rig.chords
        .send(Chord::parse("ctrl+shift+o").unwrap())
        .await
        .unwrap();
    assert!(rig.gateway.wait_for_calls(4, Duration::from_secs(5)).await);
    assert_eq!(rig.gateway.calls()[3], GatewayCall::Show(shown));
    assert_eq!(assistant.state(), ActivationState::Active);

    rig.chords.send(Chord::parse("escape").unwrap()).await.unwrap();
    state
        .wait_for(|s| *s == ActivationState::Idle)
        .await
        .unwrap();

    assistant.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_uninitialized_orchestrator_serves_local_rules() {
    let (rig, collaborators) = rig(PYTHON_SCREEN);
    let mut config = AssistantConfig::default();
    config.orchestrator.suggestion_interval_seconds = 5.0;
    let orchestrator = SuggestionOrchestrator::uninitialized(
        "OPENAI_API_KEY is not set",
        crate::integration::test_utils::fast_settings(),
    );
    let assistant = Assistant::start_with(&config, orchestrator, collaborators);

    rig.chords
        .send(Chord::parse("ctrl+shift+c").unwrap())
        .await
        .unwrap();
    assert!(rig.gateway.wait_for_calls(2, Duration::from_secs(10)).await);

    match &rig.gateway.calls()[1] {
        GatewayCall::Update(batch) => {
            assert!(!batch.is_error());
            assert!(batch.suggestions.iter().any(|s| s.title == "Missing Colon"));
            assert!(batch.suggestions.iter().any(|s| s.title == "Use Logging"));
        }
        other => panic!("expected local suggestions, got {:?}", other),
    }

    let status = assistant.status();
    assert_eq!(status.provider, None);
    assert_eq!(status.orchestrator.provider_calls, 0);
    assert!(status.context_version >= 1);

    assistant.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_auto_hide_after_quiet_period() {
    let provider = Arc::new(ScriptedProvider::always(Ok(OPTIMIZE_RESPONSE.to_string())));
    let (rig, collaborators) = rig(PYTHON_SCREEN);
    let mut config = quiet_config();
    config.presentation.auto_hide_seconds = 30;
    let assistant = Assistant::start_with(&config, scripted_orchestrator(provider), collaborators);
    let mut state = assistant.subscribe_state();

    rig.chords
        .send(Chord::parse("ctrl+shift+c").unwrap())
        .await
        .unwrap();
    state
        .wait_for(|s| *s == ActivationState::Active)
        .await
        .unwrap();
    let activated = Instant::now();

    state
        .wait_for(|s| *s == ActivationState::Idle)
        .await
        .unwrap();
    assert!(activated.elapsed() >= Duration::from_secs(29));
    assert_eq!(rig.gateway.calls().last(), Some(&GatewayCall::Hide));

    assistant.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_auto_hide_with_default_tick() {
    let provider = Arc::new(ScriptedProvider::always(Ok(OPTIMIZE_RESPONSE.to_string())));
    let (rig, collaborators) = rig(PYTHON_SCREEN);
    let config = AssistantConfig::default();
    let assistant = Assistant::start_with(&config, scripted_orchestrator(provider.clone()), collaborators);
    let mut state = assistant.subscribe_state();

    rig.chords
        .send(Chord::parse("ctrl+shift+c").unwrap())
        .await
        .unwrap();
    state
        .wait_for(|s| *s == ActivationState::Active)
        .await
        .unwrap();
    let activated = Instant::now();

    // Ticks keep serving the same batch, which must not hold the panel open.
    let hidden = tokio::time::timeout(
        Duration::from_secs(120),
        state.wait_for(|s| *s == ActivationState::Idle),
    )
    .await
    .is_ok();
    assert!(hidden, "panel stayed open through repeated ticks");
    assert!(activated.elapsed() >= Duration::from_secs(30));
    assert!(activated.elapsed() < Duration::from_secs(60));

    let calls = rig.gateway.calls();
    let updates = calls
        .iter()
        .filter(|call| matches!(call, GatewayCall::Update(_)))
        .count();
    assert_eq!(updates, 1);
    assert_eq!(calls.last(), Some(&GatewayCall::Hide));
    assert!(provider.call_count() >= 1);

    assistant.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_does_not_wait_for_a_stuck_provider() {
    let provider = Arc::new(
        ScriptedProvider::always(Ok(OPTIMIZE_RESPONSE.to_string()))
            .with_delay(Duration::from_secs(3600)),
    );
    let (rig, collaborators) = rig(PYTHON_SCREEN);
    let mut assistant = Assistant::start_with(
        &quiet_config(),
        scripted_orchestrator(provider.clone()),
        collaborators,
    );

    rig.utterances
        .send("hey copilot explain this".to_string())
        .await
        .unwrap();
    assert!(rig.gateway.wait_for_calls(1, Duration::from_secs(5)).await);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(provider.call_count(), 1);

    let started = Instant::now();
    assistant
        .shutdown_with_timeout(Duration::from_millis(500))
        .await;
    assert!(started.elapsed() <= Duration::from_millis(1500));
    assert_eq!(assistant.state(), ActivationState::Idle);
    assert_eq!(rig.gateway.calls().last(), Some(&GatewayCall::Hide));
}
