//! CLI presentation: text and json formatters per command family.

mod batch;
mod config;
mod status;

pub use batch::{format_batch_json, format_batch_text};
pub use config::{format_config_toml, format_validation_errors};
pub use status::format_status_text;
