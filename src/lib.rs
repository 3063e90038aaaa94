//! Routeguide: Deadline-Bounded Content Fan-Out
//!
//! For every location along a route, routeguide fans out one content task per
//! category, collects the results under a shared deadline, and selects exactly
//! one winner per location, falling back to a deterministic rule whenever the
//! LLM-assisted judge is unavailable or unusable.

pub mod agent;
pub mod config;
pub mod content;
pub mod error;
pub mod judge;
pub mod logging;
pub mod pipeline;
pub mod provider;
pub mod queue;
pub mod types;

pub use agent::LlmContentService;
pub use config::{ConfigLoader, RouteGuideConfig};
pub use content::{ContentGenerator, ContentWorker, FanOutExecutor, LocationResults};
pub use error::{
    GenerationError, PipelineError, ProviderError, QueueError, SelectionError, ValidationError,
};
pub use judge::{fallback_selection, ContentJudge, Selector};
pub use pipeline::{ContentPipeline, PipelineStats};
pub use queue::{BoundedQueue, QueueMode, QueueSet};
pub use types::{
    ContentCategory, ContentResult, Judgment, Location, LocationKind, RelevanceScore,
    SelectionMethod,
};
