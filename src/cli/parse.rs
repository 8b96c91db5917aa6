//! CLI parse: clap types for sidekick. No behavior; definitions only.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Sidekick CLI - context-aware coding suggestions
#[derive(Parser, Debug)]
#[command(name = "sidekick")]
#[command(about = "Context-aware coding assistant driven by screen, voice and hotkeys")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Code to operate on: a file or inline text.
#[derive(Args, Debug, Clone, Default)]
pub struct CodeInput {
    /// Read code from this file
    #[arg(long, conflicts_with = "code")]
    pub file: Option<PathBuf>,

    /// Inline code
    #[arg(long)]
    pub code: Option<String>,

    /// Language hint (detected from the code when omitted)
    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the assistant interactively on this terminal until Ctrl-C
    Run {
        /// File whose contents stand in for the screen text
        #[arg(long, conflicts_with = "screen_command")]
        screen_file: Option<PathBuf>,
        /// Command whose stdout is the screen text
        #[arg(long)]
        screen_command: Option<String>,
        /// Do not treat stdin lines as speech
        #[arg(long)]
        no_audio: bool,
        /// Do not accept `!chord` lines
        #[arg(long)]
        no_hotkeys: bool,
    },
    /// Ask a question about some code
    Ask {
        /// The question or voice-style command ("explain this loop")
        query: String,
        #[command(flatten)]
        input: CodeInput,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Suggest fixes for error messages
    Fix {
        /// Error messages; detected from the code when omitted
        errors: Vec<String>,
        #[command(flatten)]
        input: CodeInput,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Review code quality
    Review {
        #[command(flatten)]
        input: CodeInput,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Generate documentation for code
    Document {
        #[command(flatten)]
        input: CodeInput,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Rule-based suggestions, computed without a provider
    Lint {
        #[command(flatten)]
        input: CodeInput,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the effective configuration
    Validate,
}
