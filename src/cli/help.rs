//! Stable command names used in logs.

use crate::cli::parse::{Commands, ConfigCommands};

pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Run { .. } => "run".to_string(),
        Commands::Ask { .. } => "ask".to_string(),
        Commands::Fix { .. } => "fix".to_string(),
        Commands::Review { .. } => "review".to_string(),
        Commands::Document { .. } => "document".to_string(),
        Commands::Lint { .. } => "lint".to_string(),
        Commands::Config { command } => format!("config.{}", config_command_name(command)),
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Show => "show",
        ConfigCommands::Validate => "validate",
    }
}
