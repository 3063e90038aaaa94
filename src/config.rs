//! Configuration System
//!
//! Explicit configuration passed into the executor and pipeline constructors. Loaded
//! hierarchically (defaults, global file, workspace files, environment) and validated
//! before use.

use crate::error::PipelineError;
use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use crate::types::ContentCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteGuideConfig {
    /// Fan-out and selection settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Stage hand-off queue sizes
    #[serde(default)]
    pub queues: QueueConfig,

    /// LLM provider backing content generation and judging
    #[serde(default)]
    pub provider: Option<ProviderConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fan-out executor and selection stage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Categories fanned out for every location, in result order
    #[serde(default = "default_categories")]
    pub categories: Vec<ContentCategory>,

    /// Shared deadline for one location's fan-out (milliseconds)
    #[serde(default = "default_content_timeout_ms")]
    pub content_timeout_ms: u64,

    /// Deadline for the judge call before falling back (milliseconds)
    #[serde(default = "default_judge_timeout_ms")]
    pub judge_timeout_ms: u64,

    /// Locations whose fan-outs may overlap in batched mode
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

pub(crate) fn default_categories() -> Vec<ContentCategory> {
    ContentCategory::ALL.to_vec()
}

pub(crate) fn default_content_timeout_ms() -> u64 {
    30_000
}

pub(crate) fn default_judge_timeout_ms() -> u64 {
    10_000
}

pub(crate) fn default_batch_size() -> usize {
    3
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            content_timeout_ms: default_content_timeout_ms(),
            judge_timeout_ms: default_judge_timeout_ms(),
            batch_size: default_batch_size(),
        }
    }
}

impl PipelineConfig {
    pub fn content_timeout(&self) -> Duration {
        Duration::from_millis(self.content_timeout_ms)
    }

    pub fn judge_timeout(&self) -> Duration {
        Duration::from_millis(self.judge_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.categories.is_empty() {
            return Err("At least one content category is required".to_string());
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(*category) {
                return Err(format!("Duplicate content category '{}'", category));
            }
        }
        if self.content_timeout_ms == 0 {
            return Err("content_timeout_ms must be greater than zero".to_string());
        }
        if self.judge_timeout_ms == 0 {
            return Err("judge_timeout_ms must be greater than zero".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Queue capacities and the timeout used for pipeline queue operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_pending_capacity")]
    pub pending_capacity: usize,

    #[serde(default = "default_results_capacity")]
    pub results_capacity: usize,

    #[serde(default = "default_judgment_capacity")]
    pub judgment_capacity: usize,

    /// How long a pipeline put/get may block (milliseconds)
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

pub(crate) fn default_pending_capacity() -> usize {
    10
}

pub(crate) fn default_results_capacity() -> usize {
    30
}

pub(crate) fn default_judgment_capacity() -> usize {
    10
}

pub(crate) fn default_operation_timeout_ms() -> u64 {
    5_000
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            pending_capacity: default_pending_capacity(),
            results_capacity: default_results_capacity(),
            judgment_capacity: default_judgment_capacity(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl QueueConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.pending_capacity == 0 || self.results_capacity == 0 || self.judgment_capacity == 0
        {
            return Err("Queue capacities must be at least 1".to_string());
        }
        if self.operation_timeout_ms == 0 {
            return Err("operation_timeout_ms must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    Pipeline(String),
    Queues(String),
    Provider(String),
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValidationError::Pipeline(msg) => write!(f, "Pipeline: {}", msg),
            ConfigValidationError::Queues(msg) => write!(f, "Queues: {}", msg),
            ConfigValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

impl RouteGuideConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.pipeline.validate() {
            errors.push(ConfigValidationError::Pipeline(e));
        }
        if let Err(e) = self.queues.validate() {
            errors.push(ConfigValidationError::Queues(e));
        }

        // One location's full fan-out must fit, the pipeline drains it only afterwards.
        if self.queues.results_capacity < self.pipeline.categories.len() {
            errors.push(ConfigValidationError::Queues(format!(
                "results_capacity ({}) is smaller than the number of categories ({})",
                self.queues.results_capacity,
                self.pipeline.categories.len()
            )));
        }

        if let Some(provider) = &self.provider {
            if let Err(e) = provider.validate() {
                errors.push(ConfigValidationError::Provider(e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold every problem into one [`PipelineError::Config`].
    pub fn ensure_valid(&self) -> Result<(), PipelineError> {
        self.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            PipelineError::Config(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })
    }

    /// Render as TOML, suitable for `config/config.toml`.
    pub fn to_toml_string(&self) -> Result<String, PipelineError> {
        toml::to_string(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderType;

    #[test]
    fn test_default_config() {
        let config = RouteGuideConfig::default();
        assert_eq!(config.pipeline.categories, ContentCategory::ALL.to_vec());
        assert_eq!(config.pipeline.content_timeout(), Duration::from_secs(30));
        assert_eq!(config.pipeline.judge_timeout(), Duration::from_secs(10));
        assert_eq!(config.pipeline.batch_size, 3);
        assert_eq!(config.queues.pending_capacity, 10);
        assert_eq!(config.queues.results_capacity, 30);
        assert_eq!(config.queues.judgment_capacity, 10);
        assert!(config.provider.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = RouteGuideConfig::default();
        config.pipeline.content_timeout_ms = 0;
        config.queues.results_capacity = 2;
        config.provider = Some(ProviderConfig {
            provider_type: ProviderType::Anthropic,
            model: String::new(),
            api_key: None,
            endpoint: None,
            default_options: Default::default(),
        });

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(errors[0], ConfigValidationError::Pipeline(_)));
        assert!(matches!(errors[1], ConfigValidationError::Queues(_)));
        assert!(matches!(errors[2], ConfigValidationError::Provider(_)));
        assert!(config.ensure_valid().is_err());
    }

    #[test]
    fn test_duplicate_categories_rejected() {
        let mut config = RouteGuideConfig::default();
        config.pipeline.categories = vec![ContentCategory::Video, ContentCategory::Video];
        let errors = config.validate().unwrap_err();
        assert!(errors[0].to_string().contains("Duplicate content category"));
    }

    #[test]
    fn test_toml_rendering_round_trips() {
        let mut config = RouteGuideConfig::default();
        config.pipeline.categories = vec![ContentCategory::History, ContentCategory::Music];
        let rendered = config.to_toml_string().unwrap();
        assert!(rendered.contains("[pipeline]"));

        let parsed: RouteGuideConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.pipeline.categories, config.pipeline.categories);
        assert_eq!(parsed.queues.results_capacity, 30);
    }
}
