//! Merge rules: defaults, override order, conflict handling.
//!
//! Scalar defaults are registered here so every later source overrides key by
//! key. Lists (the command table) and optional chords are left to serde
//! defaults: a source that sets them replaces them wholesale.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("screen.capture_interval_seconds", 2.0)?
        .set_default("audio.enabled", true)?
        .set_default("audio.hotword", "hey copilot")?
        .set_default("audio.language", "en-US")?
        .set_default("hotkeys.enabled", true)?
        .set_default("orchestrator.cache_enabled", true)?
        .set_default("orchestrator.cache_ttl_seconds", 300)?
        .set_default("orchestrator.min_call_interval_seconds", 1.0)?
        .set_default("presentation.auto_hide_seconds", 30)?
        .set_default("provider.provider_type", "openai")
}
