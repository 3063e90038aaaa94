//! Content generation: the service seam, the per-task worker, and the fan-out executor.
//!
//! The generation service is an external collaborator reached through
//! [`ContentGenerator`]. Everything in this module turns its failures into
//! zero-score [`ContentResult`]s so callers always see one result per category.

use crate::error::GenerationError;
use crate::types::{ContentCategory, ContentResult, Location};
use async_trait::async_trait;

mod executor;
mod worker;

pub use executor::{FanOutExecutor, LocationResults};
pub use worker::ContentWorker;

/// Produces one content record for a (category, location) pair.
///
/// Implementations may be slow, may fail, and may return malformed data; the
/// worker and executor contain all of that.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        category: ContentCategory,
        location: &Location,
    ) -> Result<ContentResult, GenerationError>;
}
