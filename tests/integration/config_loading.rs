//! Layered configuration: global file, workspace files and environment.

use crate::integration::test_utils::with_xdg_env;
use sidekick::cli::{exit_code, Commands, ConfigCommands, RunContext};
use sidekick::config::{global_config_path, AssistantConfig, ConfigLoader, ProviderType};
use sidekick::error::{CliError, ConfigError};
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[test]
fn test_layers_apply_in_priority_order() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let config = with_xdg_env(&test_dir, || {
        let global = global_config_path().unwrap();
        assert!(global.starts_with(test_dir.path()));
        write(
            &global,
            r#"
[orchestrator]
max_tokens = 300
temperature = 0.1

[provider]
provider_type = "anthropic"
model = "global-model"
"#,
        );
        write(
            &workspace.path().join("config/config.toml"),
            "[orchestrator]\nmax_tokens = 400\n",
        );
        std::env::set_var("SIDEKICK__PROVIDER__MODEL", "env-model");

        ConfigLoader::load(workspace.path()).unwrap()
    });

    assert_eq!(config.orchestrator.max_tokens, 400);
    assert!((config.orchestrator.temperature - 0.1).abs() < f32::EPSILON);
    assert_eq!(config.provider.provider_type, ProviderType::Anthropic);
    assert_eq!(config.provider.model, "env-model");
    assert_eq!(config.screen, AssistantConfig::default().screen);
}

#[test]
fn test_empty_environment_yields_defaults() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    // Defaults derive the log path from HOME, so build them under the same env.
    let (config, expected) = with_xdg_env(&test_dir, || {
        (
            ConfigLoader::load(workspace.path()).unwrap(),
            AssistantConfig::default(),
        )
    });
    assert_eq!(config, expected);
    assert!(config.logging.file.starts_with(test_dir.path()));
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_file_is_a_load_error() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let result = with_xdg_env(&test_dir, || {
        write(
            &workspace.path().join("config/config.toml"),
            "[orchestrator\nmax_tokens = ",
        );
        ConfigLoader::load(workspace.path())
    });
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_explicit_file_must_exist() {
    let workspace = TempDir::new().unwrap();
    let missing = workspace.path().join("nope.toml");

    let result = RunContext::new(workspace.path().to_path_buf(), Some(missing));
    match result {
        Err(err) => assert_eq!(exit_code(&err), 2),
        Ok(_) => panic!("missing config file should fail"),
    }
}

#[tokio::test]
async fn test_config_commands_use_the_explicit_file() {
    let workspace = TempDir::new().unwrap();
    let file = workspace.path().join("sidekick.toml");
    write(
        &file,
        r#"
[orchestrator]
temperature = 4.0

[provider]
provider_type = "openai"
api_key = "sk-secret"
"#,
    );

    let ctx = RunContext::new(workspace.path().to_path_buf(), Some(file)).unwrap();

    let shown = ctx
        .execute(&Commands::Config {
            command: ConfigCommands::Show,
        })
        .await
        .unwrap();
    assert!(shown.contains("temperature = 4.0"));
    assert!(!shown.contains("sk-secret"));

    let validated = ctx
        .execute(&Commands::Config {
            command: ConfigCommands::Validate,
        })
        .await;
    match validated {
        Err(err @ CliError::Validation(_)) => {
            assert!(err.to_string().contains("temperature"));
            assert_eq!(exit_code(&err), 2);
        }
        other => panic!("expected a validation error, got {:?}", other),
    }
}
