//! CLI route: single route table and run context. Dispatches to the
//! orchestrator, the assistant and presentation.

use crate::assistant::{AudioInput, Assistant, Collaborators};
use crate::cli::parse::{CodeInput, Commands, ConfigCommands, OutputFormat};
use crate::cli::presentation::{
    format_batch_json, format_batch_text, format_config_toml, format_status_text,
    format_validation_errors,
};
use crate::cli::command_name;
use crate::config::{AssistantConfig, ConfigLoader};
use crate::console::{ConsoleGateway, ConsoleRouter, ConsoleSpeech};
use crate::context::{detect_error_indicators, Context, ScreenAnalyzer};
use crate::error::CliError;
use crate::orchestrator::SuggestionOrchestrator;
use crate::sensor::{
    ChannelHotkeyBackend, CommandTextExtractor, FileTextExtractor, HotkeyBackend, TextExtractor,
};
use crate::types::SuggestionBatch;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

const CONSOLE_QUEUE_CAPACITY: usize = 16;

/// Runtime context for CLI execution: workspace and effective configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: AssistantConfig,
    orchestrator: Option<SuggestionOrchestrator>,
    color: bool,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CliError> {
        let config = ConfigLoader::resolve(&workspace_root, config_path.as_deref())?;
        Ok(Self::from_config(workspace_root, config))
    }

    pub fn from_config(workspace_root: PathBuf, config: AssistantConfig) -> Self {
        Self {
            workspace_root,
            config,
            orchestrator: None,
            color: true,
        }
    }

    /// Use `orchestrator` instead of building one from the provider config.
    pub fn with_orchestrator(mut self, orchestrator: SuggestionOrchestrator) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub async fn execute(&self, command: &Commands) -> Result<String, CliError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = %name, "Command started");

        let result = self.execute_inner(command).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => info!(command = %name, duration_ms, "Command completed"),
            Err(e) => warn!(command = %name, duration_ms, error = %e, "Command failed"),
        }
        result
    }

    async fn execute_inner(&self, command: &Commands) -> Result<String, CliError> {
        match command {
            Commands::Run {
                screen_file,
                screen_command,
                no_audio,
                no_hotkeys,
            } => {
                self.run_interactive(
                    screen_file.as_deref(),
                    screen_command.as_deref(),
                    !no_audio,
                    !no_hotkeys,
                )
                .await
            }
            Commands::Ask { query, input, format } => {
                let code = read_code(input)?.unwrap_or_default();
                let context = build_context(&code, input.language.as_deref());
                let keyword = self.config.commands.classify(query).to_string();
                let batch = self
                    .orchestrator()?
                    .generate(&context, Some(&keyword), Some(query))
                    .await;
                self.render(&batch, *format)
            }
            Commands::Fix { errors, input, format } => {
                let code = read_code(input)?;
                let mut indicators = errors.clone();
                if indicators.is_empty() {
                    if let Some(code) = &code {
                        indicators.extend(detect_error_indicators(code));
                    }
                }
                if indicators.is_empty() {
                    return Ok("No error indicators found.".to_string());
                }
                let batch = self
                    .orchestrator()?
                    .suggest_fixes(&indicators, code.as_deref())
                    .await;
                self.render(&batch, *format)
            }
            Commands::Review { input, format } => {
                let code = read_code(input)?.ok_or(CliError::MissingInput)?;
                let language = language_of(&code, input.language.as_deref());
                let batch = self
                    .orchestrator()?
                    .analyze_code_quality(&code, language.as_deref())
                    .await;
                self.render(&batch, *format)
            }
            Commands::Document { input, format } => {
                let code = read_code(input)?.ok_or(CliError::MissingInput)?;
                let language = language_of(&code, input.language.as_deref());
                let batch = self
                    .orchestrator()?
                    .generate_documentation(&code, language.as_deref())
                    .await;
                self.render(&batch, *format)
            }
            Commands::Lint { input, format } => {
                let code = read_code(input)?.ok_or(CliError::MissingInput)?;
                let context = build_context(&code, input.language.as_deref());
                let batch = self.orchestrator()?.local_suggestions(&context);
                self.render(&batch, *format)
            }
            Commands::Config { command } => match command {
                ConfigCommands::Show => format_config_toml(&self.config),
                ConfigCommands::Validate => match self.config.validate() {
                    Ok(()) => Ok("Configuration is valid.".to_string()),
                    Err(errors) => Err(CliError::Validation(format_validation_errors(&errors))),
                },
            },
        }
    }

    fn orchestrator(&self) -> Result<SuggestionOrchestrator, CliError> {
        if let Some(orchestrator) = &self.orchestrator {
            return Ok(orchestrator.clone());
        }
        let settings = self.config.orchestrator.settings(&self.config.commands);
        Ok(SuggestionOrchestrator::from_config(&self.config.provider, settings)?)
    }

    fn render(&self, batch: &SuggestionBatch, format: OutputFormat) -> Result<String, CliError> {
        if let Some(kind) = batch.error {
            return Err(CliError::Request {
                kind,
                message: batch.summary.clone(),
            });
        }
        match format {
            OutputFormat::Text => Ok(format_batch_text(batch, self.color)),
            OutputFormat::Json => format_batch_json(batch),
        }
    }

    fn screen_source(
        &self,
        screen_file: Option<&Path>,
        screen_command: Option<&str>,
    ) -> Result<Arc<dyn TextExtractor>, CliError> {
        let command = screen_command.or(self.config.screen.text_command.as_deref());
        if let Some(line) = command.filter(|_| screen_file.is_none()) {
            let extractor = CommandTextExtractor::from_command_line(line)
                .ok_or_else(|| CliError::Runtime("screen command is empty".to_string()))?;
            return Ok(Arc::new(extractor));
        }
        let path = screen_file
            .map(Path::to_path_buf)
            .or_else(|| self.config.screen.text_file.clone())
            .ok_or_else(|| {
                CliError::Runtime("no screen source: pass --screen-file or --screen-command".to_string())
            })?;
        let path = if path.is_relative() {
            self.workspace_root.join(path)
        } else {
            path
        };
        Ok(Arc::new(FileTextExtractor::new(path)))
    }

    async fn run_interactive(
        &self,
        screen_file: Option<&Path>,
        screen_command: Option<&str>,
        audio: bool,
        hotkeys: bool,
    ) -> Result<String, CliError> {
        if let Err(errors) = self.config.validate() {
            return Err(CliError::Validation(format_validation_errors(&errors)));
        }
        let screen = self.screen_source(screen_file, screen_command)?;

        let gateway = Arc::new(ConsoleGateway::new(self.color));
        let (utterance_tx, utterance_rx) = mpsc::channel(CONSOLE_QUEUE_CAPACITY);
        let (chord_tx, chord_rx) = mpsc::channel(CONSOLE_QUEUE_CAPACITY);
        let (ui_tx, ui_rx) = mpsc::channel(CONSOLE_QUEUE_CAPACITY);

        let speech = Arc::new(ConsoleSpeech::new(utterance_rx));
        let collaborators = Collaborators {
            screen,
            audio: audio.then(|| AudioInput {
                capture: speech.clone(),
                recognizer: speech,
            }),
            hotkeys: hotkeys
                .then(|| Box::new(ChannelHotkeyBackend::new(chord_rx)) as Box<dyn HotkeyBackend>),
            gateway: gateway.clone(),
            ui_events: ui_rx,
        };

        let assistant = match &self.orchestrator {
            Some(orchestrator) => {
                Assistant::start_with(&self.config, orchestrator.clone(), collaborators)
            }
            None => Assistant::start(&self.config, collaborators)?,
        };

        let router = ConsoleRouter {
            utterances: utterance_tx,
            chords: chord_tx,
            ui_events: ui_tx,
        };
        let input = tokio::io::BufReader::new(tokio::io::stdin());
        let input_task = tokio::spawn(router.run(input, gateway));

        eprintln!(
            "Sidekick running. Say \"{}\" or press a chord (e.g. !{}); Ctrl-C to stop.",
            self.config.audio.hotword,
            self.config
                .hotkeys
                .activate
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "ctrl+shift+c".to_string()),
        );

        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
        }

        let status = assistant.status();
        input_task.abort();
        assistant.shutdown().await;
        Ok(format_status_text(&status))
    }
}

fn read_code(input: &CodeInput) -> Result<Option<String>, CliError> {
    if let Some(code) = &input.code {
        return Ok(Some(code.clone()));
    }
    match &input.file {
        Some(path) => std::fs::read_to_string(path)
            .map(Some)
            .map_err(|e| CliError::Input {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn build_context(code: &str, language: Option<&str>) -> Context {
    let analyzer = ScreenAnalyzer::new();
    match language {
        Some(language) => analyzer.analyze_as(code, language, Utc::now()),
        None => analyzer.analyze(code, Utc::now()),
    }
}

fn language_of(code: &str, hint: Option<&str>) -> Option<String> {
    hint.map(|l| l.trim().to_lowercase())
        .or_else(|| crate::context::classify_language(code).map(str::to_string))
}
