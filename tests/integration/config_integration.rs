//! Integration tests for layered configuration loading

use routeguide::config::ConfigLoader;
use routeguide::provider::ProviderType;
use routeguide::ContentCategory;
use std::fs;
use tempfile::TempDir;

use crate::integration::ENV_MUTEX;

/// Runs `f` with the given variables set, restoring the previous values afterwards.
fn with_env<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
    let _guard = ENV_MUTEX.lock();
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
        .collect();
    for (key, value) in vars {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(&key, value),
            None => std::env::remove_var(&key),
        }
    }
    result
}

fn write_workspace_config(root: &std::path::Path, name: &str, contents: &str) {
    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join(name), contents).unwrap();
}

#[test]
fn test_defaults_without_any_files() {
    let workspace = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", Some(xdg.path().to_str().unwrap())),
            ("ROUTEGUIDE_ENV", None),
        ],
        || ConfigLoader::load_validated(workspace.path()).unwrap(),
    );

    assert_eq!(config.pipeline.categories, ContentCategory::ALL.to_vec());
    assert_eq!(config.pipeline.content_timeout_ms, 30_000);
    assert_eq!(config.queues.results_capacity, 30);
    assert!(config.provider.is_none());
}

#[test]
fn test_workspace_and_env_specific_files_layer() {
    let workspace = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    write_workspace_config(
        workspace.path(),
        "config.toml",
        r#"
[pipeline]
content_timeout_ms = 12000
batch_size = 2

[provider]
provider_type = "anthropic"
model = "claude-sonnet"
api_key = "workspace-key"
"#,
    );
    write_workspace_config(
        workspace.path(),
        "staging.toml",
        r#"
[pipeline]
batch_size = 5
"#,
    );

    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", Some(xdg.path().to_str().unwrap())),
            ("ROUTEGUIDE_ENV", Some("staging")),
        ],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );

    assert_eq!(config.pipeline.content_timeout_ms, 12_000);
    assert_eq!(config.pipeline.batch_size, 5);
    assert_eq!(config.pipeline.judge_timeout_ms, 10_000);
    let provider = config.provider.unwrap();
    assert_eq!(provider.provider_type, ProviderType::Anthropic);
    assert_eq!(provider.api_key.as_deref(), Some("workspace-key"));
}

#[test]
fn test_environment_overrides_files() {
    let workspace = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    write_workspace_config(
        workspace.path(),
        "config.toml",
        "[queues]\nresults_capacity = 12\n",
    );

    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", Some(xdg.path().to_str().unwrap())),
            ("ROUTEGUIDE_ENV", None),
            ("ROUTEGUIDE__QUEUES__RESULTS_CAPACITY", Some("9")),
            ("ROUTEGUIDE__PIPELINE__JUDGE_TIMEOUT_MS", Some("2500")),
        ],
        || ConfigLoader::load(workspace.path()).unwrap(),
    );

    assert_eq!(config.queues.results_capacity, 9);
    assert_eq!(config.pipeline.judge_timeout_ms, 2_500);
}

#[test]
fn test_global_file_is_lowest_file_layer() {
    let workspace = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    write_workspace_config(
        workspace.path(),
        "config.toml",
        "[pipeline]\nbatch_size = 4\n",
    );

    let config = with_env(
        &[
            ("XDG_CONFIG_HOME", Some(xdg.path().to_str().unwrap())),
            ("ROUTEGUIDE_ENV", None),
        ],
        || {
            let global = ConfigLoader::global_config_path()?;
            // Platforms without XDG support resolve elsewhere; never touch a real config dir.
            if !global.starts_with(xdg.path()) {
                return None;
            }
            fs::create_dir_all(global.parent()?).ok()?;
            fs::write(
                &global,
                "[pipeline]\nbatch_size = 8\njudge_timeout_ms = 4000\n",
            )
            .ok()?;
            Some(ConfigLoader::load(workspace.path()).unwrap())
        },
    );

    if let Some(config) = config {
        assert_eq!(config.pipeline.batch_size, 4);
        assert_eq!(config.pipeline.judge_timeout_ms, 4_000);
    }
}

#[test]
fn test_invalid_configuration_rejected() {
    let workspace = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    write_workspace_config(
        workspace.path(),
        "config.toml",
        "[pipeline]\ncategories = [\"history\", \"youtube\", \"spotify\"]\n\n[queues]\nresults_capacity = 2\n",
    );

    let result = with_env(
        &[
            ("XDG_CONFIG_HOME", Some(xdg.path().to_str().unwrap())),
            ("ROUTEGUIDE_ENV", None),
        ],
        || ConfigLoader::load_validated(workspace.path()),
    );

    let message = result.unwrap_err().to_string();
    assert!(message.contains("results_capacity"));
}
