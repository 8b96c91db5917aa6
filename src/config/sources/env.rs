//! Environment source: `SIDEKICK__ORCHESTRATOR__MAX_TOKENS=500` overrides
//! `orchestrator.max_tokens`.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("SIDEKICK")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
