//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; the route table dispatches to the assistant and
//! orchestrator.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::{exit_code, map_error};
pub use parse::{Cli, CodeInput, Commands, ConfigCommands, OutputFormat};
pub use presentation::{
    format_batch_json, format_batch_text, format_config_toml, format_status_text,
    format_validation_errors,
};
pub use route::RunContext;
