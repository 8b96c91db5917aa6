//! Single entry point for loading configuration.

use super::merge::merge_policy;
use super::sources::{env, global_file, workspace_file};
use super::AssistantConfig;
use crate::error::ConfigError;
use config::File;
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, workspace files, then environment.
    pub fn load(workspace_root: &Path) -> Result<AssistantConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = env::add_to_builder(builder);

        let config: AssistantConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Defaults plus exactly one file, which must exist.
    pub fn load_from_file(path: &Path) -> Result<AssistantConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Load(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Effective configuration: an explicit file when given, otherwise the
    /// layered workspace lookup.
    pub fn resolve(
        workspace_root: &Path,
        config_file: Option<&Path>,
    ) -> Result<AssistantConfig, ConfigError> {
        match config_file {
            Some(path) => Self::load_from_file(path),
            None => Self::load(workspace_root),
        }
    }
}
