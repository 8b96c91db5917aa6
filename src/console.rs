//! Terminal stand-ins for the boundary collaborators, used by `sidekick run`.
//!
//! Every stdin line is one input:
//! - `!ctrl+shift+c` presses a chord,
//! - `:close` and `:click N` act on the displayed batch,
//! - anything else is a spoken utterance (`hey copilot explain this`).

use crate::cli::format_batch_text;
use crate::error::SensorError;
use crate::presentation::PresentationGateway;
use crate::sensor::{AudioBuffer, AudioCapture, Chord, SpeechRecognizer};
use crate::types::{SuggestionBatch, UiEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Sample rate reported for typed "audio".
const CONSOLE_SAMPLE_RATE: u32 = 16_000;

/// Typed utterances delivered as audio buffers. A capture window with no
/// line yields an empty buffer; a closed input ends the audio sensor.
pub struct ConsoleSpeech {
    lines: tokio::sync::Mutex<mpsc::Receiver<String>>,
}

impl ConsoleSpeech {
    pub fn new(lines: mpsc::Receiver<String>) -> Self {
        Self {
            lines: tokio::sync::Mutex::new(lines),
        }
    }
}

#[async_trait]
impl AudioCapture for ConsoleSpeech {
    async fn capture(&self, duration: Duration) -> Result<AudioBuffer, SensorError> {
        let mut lines = self.lines.lock().await;
        match tokio::time::timeout(duration, lines.recv()).await {
            Ok(Some(line)) => Ok(AudioBuffer {
                data: line.into_bytes(),
                sample_rate: CONSOLE_SAMPLE_RATE,
            }),
            Ok(None) => Err(SensorError::Closed),
            Err(_) => Ok(AudioBuffer::default()),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for ConsoleSpeech {
    async fn recognize(&self, buffer: &AudioBuffer, _language: &str) -> Result<String, SensorError> {
        let text = String::from_utf8_lossy(&buffer.data).trim().to_string();
        if text.is_empty() {
            return Err(SensorError::NoSpeechDetected);
        }
        Ok(text)
    }
}

/// Prints batches to stdout and remembers the one on display so `:click N`
/// can resolve it.
pub struct ConsoleGateway {
    displayed: Mutex<Option<SuggestionBatch>>,
    color: bool,
}

impl ConsoleGateway {
    pub fn new(color: bool) -> Self {
        Self {
            displayed: Mutex::new(None),
            color,
        }
    }

    pub fn displayed(&self) -> Option<SuggestionBatch> {
        self.displayed.lock().clone()
    }

    fn render(&self, heading: &str, batch: &SuggestionBatch) {
        println!("\n== {} ==\n{}", heading, format_batch_text(batch, self.color));
        *self.displayed.lock() = Some(batch.clone());
    }
}

impl PresentationGateway for ConsoleGateway {
    fn show(&self, batch: &SuggestionBatch) {
        self.render("Sidekick", batch);
    }

    fn update(&self, batch: &SuggestionBatch) {
        self.render("Updated suggestions", batch);
    }

    fn hide(&self) {
        if self.displayed.lock().take().is_some() {
            println!("== Sidekick hidden ==");
        }
    }
}

/// One parsed stdin line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleLine {
    Chord(Chord),
    Close,
    Click(usize),
    Utterance(String),
    Invalid(String),
    Empty,
}

pub fn parse_line(line: &str) -> ConsoleLine {
    let line = line.trim();
    if line.is_empty() {
        return ConsoleLine::Empty;
    }
    if let Some(chord) = line.strip_prefix('!') {
        return match Chord::parse(chord) {
            Ok(chord) => ConsoleLine::Chord(chord),
            Err(err) => ConsoleLine::Invalid(err.to_string()),
        };
    }
    if let Some(command) = line.strip_prefix(':') {
        let mut parts = command.split_whitespace();
        return match (parts.next(), parts.next()) {
            (Some("close"), None) => ConsoleLine::Close,
            (Some("click"), Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => ConsoleLine::Click(n),
                _ => ConsoleLine::Invalid(format!("not a suggestion number: {}", n)),
            },
            _ => ConsoleLine::Invalid(format!("unknown command: {}", line)),
        };
    }
    ConsoleLine::Utterance(line.to_string())
}

/// Fans stdin lines out to the speech, hotkey and UI channels.
pub struct ConsoleRouter {
    pub utterances: mpsc::Sender<String>,
    pub chords: mpsc::Sender<Chord>,
    pub ui_events: mpsc::Sender<UiEvent>,
}

impl ConsoleRouter {
    /// Route lines until the input ends or every receiver is gone.
    pub async fn run<R>(self, reader: R, gateway: std::sync::Arc<ConsoleGateway>)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "Failed to read console input");
                    break;
                }
            };

            let delivered = match parse_line(&line) {
                ConsoleLine::Chord(chord) => self.chords.send(chord).await.is_ok(),
                ConsoleLine::Close => self.ui_events.send(UiEvent::Closed).await.is_ok(),
                ConsoleLine::Click(n) => {
                    let clicked = gateway
                        .displayed()
                        .and_then(|batch| batch.suggestions.get(n - 1).cloned());
                    match clicked {
                        Some(suggestion) => self
                            .ui_events
                            .send(UiEvent::SuggestionClicked(suggestion))
                            .await
                            .is_ok(),
                        None => {
                            eprintln!("No suggestion #{} on display", n);
                            true
                        }
                    }
                }
                ConsoleLine::Utterance(text) => self.utterances.send(text).await.is_ok(),
                ConsoleLine::Invalid(message) => {
                    eprintln!("{}", message);
                    true
                }
                ConsoleLine::Empty => true,
            };
            if !delivered {
                debug!("Console input receiver closed");
            }
        }
        debug!("Console input ended");
    }
}
