//! Audio sensor: hotword spotting and voice command capture.

use super::{sleep_or_cancel, ERROR_BACKOFF};
use crate::command::CommandTable;
use crate::error::SensorError;
use crate::types::SensorEvent;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Raw captured audio.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioBuffer {
    pub data: Vec<u8>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Microphone (or stand-in) producing fixed-duration buffers.
#[async_trait]
pub trait AudioCapture: Send + Sync {
    async fn capture(&self, duration: Duration) -> Result<AudioBuffer, SensorError>;
}

/// Speech-to-text collaborator.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Fails with [`SensorError::NoSpeechDetected`] or
    /// [`SensorError::ServiceUnavailable`].
    async fn recognize(&self, buffer: &AudioBuffer, language: &str) -> Result<String, SensorError>;
}

#[derive(Debug, Clone)]
pub struct AudioSettings {
    pub hotword: String,
    /// Length of each listening buffer while waiting for the hotword
    pub listen_window: Duration,
    /// Length of the buffer captured after the hotword
    pub command_window: Duration,
    pub language: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            hotword: "hey copilot".to_string(),
            listen_window: Duration::from_secs(2),
            command_window: Duration::from_secs(3),
            language: "en-US".to_string(),
        }
    }
}

pub struct AudioSensor {
    capture: Arc<dyn AudioCapture>,
    recognizer: Arc<dyn SpeechRecognizer>,
    settings: AudioSettings,
    commands: CommandTable,
    events: mpsc::Sender<SensorEvent>,
}

impl AudioSensor {
    pub fn new(
        capture: Arc<dyn AudioCapture>,
        recognizer: Arc<dyn SpeechRecognizer>,
        settings: AudioSettings,
        commands: CommandTable,
        events: mpsc::Sender<SensorEvent>,
    ) -> Self {
        Self {
            capture,
            recognizer,
            settings,
            commands,
            events,
        }
    }

    /// Text following the hotword in `utterance`, if the hotword is present.
    pub fn after_hotword<'a>(&self, utterance: &'a str) -> Option<&'a str> {
        let hotword = self.settings.hotword.trim().to_lowercase();
        if hotword.is_empty() {
            return None;
        }
        let lowered = utterance.to_lowercase();
        let idx = lowered.find(&hotword)?;
        // Lowercasing can change byte lengths; fall back to an empty remainder.
        let rest = utterance.get(idx + hotword.len()..).unwrap_or("");
        Some(rest.trim_start_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation()))
    }

    async fn listen(&self, window: Duration) -> Result<String, SensorError> {
        let buffer = self.capture.capture(window).await?;
        if buffer.is_empty() {
            return Err(SensorError::NoSpeechDetected);
        }
        self.recognizer.recognize(&buffer, &self.settings.language).await
    }

    async fn emit(&self, event: SensorEvent) -> Result<(), SensorError> {
        self.events.send(event).await.map_err(|_| SensorError::Closed)
    }

    /// One listen cycle: wait for the hotword, then capture and classify a
    /// command. An utterance that already carries text after the hotword is
    /// classified directly.
    pub async fn listen_once(&self) -> Result<(), SensorError> {
        let utterance = self.listen(self.settings.listen_window).await?;
        let Some(rest) = self.after_hotword(&utterance) else {
            debug!(len = utterance.len(), "Utterance without hotword ignored");
            return Ok(());
        };
        let rest = rest.trim().to_string();

        info!("Hotword detected");
        self.emit(SensorEvent::HotwordDetected).await?;

        let text = if rest.is_empty() {
            self.listen(self.settings.command_window).await?
        } else {
            rest
        };
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(SensorError::NoSpeechDetected);
        }

        let command = self.commands.classify(&text).to_string();
        info!(command = %command, "Voice command recognized");
        self.emit(SensorEvent::VoiceCommand { command, text }).await
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!(hotword = %self.settings.hotword, "Audio sensor started");
        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.listen_once() => result,
            };

            match result {
                Ok(()) => {}
                Err(SensorError::NoSpeechDetected) => {
                    debug!("No speech detected");
                }
                Err(SensorError::Closed) => {
                    info!("Sensor event channel closed");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "Speech recognition failed");
                    if !sleep_or_cancel(ERROR_BACKOFF, &cancel).await {
                        break;
                    }
                }
            }
        }
        info!("Audio sensor stopped");
    }
}
