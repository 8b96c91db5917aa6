//! Screen sensor: periodic text capture into the context store.

use super::{sleep_or_cancel, ERROR_BACKOFF};
use crate::context::{ContextStore, ScreenAnalyzer};
use crate::error::SensorError;
use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Source of on-screen text (OCR, accessibility APIs, a file, ...).
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self) -> Result<String, SensorError>;
}

/// Reads screen text from a file that some other tool keeps up to date.
pub struct FileTextExtractor {
    path: PathBuf,
}

impl FileTextExtractor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract_text(&self) -> Result<String, SensorError> {
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SensorError::Capture(format!("{}: {}", self.path.display(), e)))
    }
}

/// Runs an external command (for example a screenshot + OCR pipeline) and
/// uses its stdout as the screen text.
pub struct CommandTextExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandTextExtractor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a shell-style command line on whitespace.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl TextExtractor for CommandTextExtractor {
    async fn extract_text(&self) -> Result<String, SensorError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SensorError::Capture(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SensorError::Capture(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Captures screen text every `interval` and replaces the stored context.
pub struct ScreenSensor {
    extractor: Arc<dyn TextExtractor>,
    store: Arc<ContextStore>,
    analyzer: ScreenAnalyzer,
    interval: Duration,
}

impl ScreenSensor {
    pub fn new(extractor: Arc<dyn TextExtractor>, store: Arc<ContextStore>, interval: Duration) -> Self {
        Self {
            extractor,
            store,
            analyzer: ScreenAnalyzer::new(),
            interval,
        }
    }

    /// One capture cycle. Returns the new store version.
    pub async fn capture_once(&self) -> Result<u64, SensorError> {
        let text = self.extractor.extract_text().await?;
        let context = self.analyzer.analyze(&text, Utc::now());
        debug!(
            code_detected = context.code_detected,
            language = ?context.language,
            errors = context.error_indicators.len(),
            snippets = context.code_snippets.len(),
            "Screen captured"
        );
        Ok(self.store.replace(context))
    }

    pub async fn run(self, cancel: CancellationToken) {
        info!(interval_ms = self.interval.as_millis() as u64, "Screen sensor started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.capture_once() => result,
            };

            if let Err(err) = result {
                warn!(error = %err, "Screen capture failed");
                if !sleep_or_cancel(ERROR_BACKOFF, &cancel).await {
                    break;
                }
            }
        }

        info!("Screen sensor stopped");
    }
}
