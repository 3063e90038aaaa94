//! Merge rules: defaults, override order, conflict handling.

use crate::config::{
    default_batch_size, default_content_timeout_ms, default_judge_timeout_ms,
    default_judgment_capacity, default_operation_timeout_ms, default_pending_capacity,
    default_results_capacity,
};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources replace whole values; lists such as `pipeline.categories` are
/// not concatenated.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("pipeline.content_timeout_ms", default_content_timeout_ms())?
        .set_default("pipeline.judge_timeout_ms", default_judge_timeout_ms())?
        .set_default("pipeline.batch_size", default_batch_size() as u64)?
        .set_default("queues.pending_capacity", default_pending_capacity() as u64)?
        .set_default("queues.results_capacity", default_results_capacity() as u64)?
        .set_default("queues.judgment_capacity", default_judgment_capacity() as u64)?
        .set_default("queues.operation_timeout_ms", default_operation_timeout_ms())
}
