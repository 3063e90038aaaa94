//! Error types for the route content pipeline.

use std::time::Duration;
use thiserror::Error;

/// Bounded queue errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Queue '{queue}' is full (capacity {capacity})")]
    Full { queue: &'static str, capacity: usize },

    #[error("Queue '{queue}' is empty")]
    Empty { queue: &'static str },
}

/// Invalid domain values rejected at construction time
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid latitude: {0}. Must be between -90 and 90.")]
    Latitude(f64),

    #[error("Invalid longitude: {0}. Must be between -180 and 180.")]
    Longitude(f64),

    #[error("Invalid distance: {0}. Must be >= 0.")]
    Distance(f64),

    #[error("Invalid relevance_score: {0}. Must be 0-100.")]
    RelevanceScore(i64),

    #[error("Unknown content category: {0}")]
    UnknownCategory(String),

    #[error("Unknown location kind: {0}")]
    UnknownLocationKind(String),

    #[error("Invalid judgment: {0}")]
    Judgment(String),
}

/// Model provider errors (transport, auth, response decoding)
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider error: {0}")]
    Other(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Provider model not found: {0}")]
    ModelNotFound(String),
}

/// Failure of a single generation-service call
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Requested {requested} content but received {received}")]
    CategoryMismatch { requested: String, received: String },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl GenerationError {
    /// Short machine-readable kind, recorded in failure metadata.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Provider(_) => "provider",
            GenerationError::Timeout(_) => "timeout",
            GenerationError::Malformed(_) => "malformed",
            GenerationError::CategoryMismatch { .. } => "category_mismatch",
            GenerationError::Invalid(_) => "invalid",
        }
    }
}

/// Caller errors from the selection stage
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Cannot evaluate empty content list")]
    NoCandidates,

    #[error("Content results span several locations: expected '{expected}', found '{found}'")]
    MixedLocations { expected: String, found: String },
}

/// Pipeline-level errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "Pipeline queues are not idle (pending={pending}, results={results}, judgments={judgments}); clear them before starting a run"
    )]
    QueuesNotIdle {
        pending: usize,
        results: usize,
        judgments: usize,
    },

    #[error("Queue returned location '{found}' while processing '{expected}'")]
    LocationMismatch { expected: String, found: String },
}

impl From<config::ConfigError> for PipelineError {
    fn from(err: config::ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}
