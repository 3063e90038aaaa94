//! Config loading facade: assembles the layered sources and deserializes the result.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::RouteGuideConfig;
use crate::error::PipelineError;
use config::{ConfigError, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`RouteGuideConfig`] from defaults, files and the environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): built-in defaults, global config file,
    /// `config/config.toml`, `config/{ROUTEGUIDE_ENV}.toml`, `ROUTEGUIDE__*` variables.
    pub fn load(workspace_root: &Path) -> Result<RouteGuideConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder);

        let config: RouteGuideConfig = builder.build()?.try_deserialize()?;
        debug!(
            workspace_root = %workspace_root.display(),
            categories = config.pipeline.categories.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Load and validate configuration for a workspace.
    pub fn load_validated(workspace_root: &Path) -> Result<RouteGuideConfig, PipelineError> {
        let config = Self::load(workspace_root)?;
        config.ensure_valid()?;
        Ok(config)
    }

    /// Load configuration from a single TOML file on top of the defaults.
    pub fn load_from_file(path: &Path) -> Result<RouteGuideConfig, ConfigError> {
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .build()?
            .try_deserialize()
    }

    /// Global config file location, if the platform has a config directory.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    /// Built-in defaults only.
    pub fn default() -> RouteGuideConfig {
        RouteGuideConfig::default()
    }
}
