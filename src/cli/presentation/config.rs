//! Configuration presentation.

use crate::config::{AssistantConfig, ValidationError};
use crate::error::CliError;

pub fn format_config_toml(config: &AssistantConfig) -> Result<String, CliError> {
    let mut shown = config.clone();
    if shown.provider.api_key.is_some() {
        shown.provider.api_key = Some("********".to_string());
    }
    shown.to_toml().map_err(CliError::from)
}

pub fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
