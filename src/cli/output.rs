//! CLI output: error mapping from domain errors to the CLI surface.

use crate::error::{CliError, ConfigError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &CliError) -> String {
    e.to_string()
}

/// Process exit code for a failed command.
pub fn exit_code(e: &CliError) -> i32 {
    match e {
        CliError::Config(ConfigError::MissingCredentials(_)) => 3,
        CliError::Config(_) | CliError::Validation(_) => 2,
        CliError::Request { .. } => 4,
        _ => 1,
    }
}
