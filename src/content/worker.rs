//! Worker: resolves one content task and never fails.

use super::ContentGenerator;
use crate::error::GenerationError;
use crate::types::{ContentCategory, ContentResult, Location};
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs the generation service for exactly one (category, location) pair.
#[derive(Clone)]
pub struct ContentWorker {
    generator: Arc<dyn ContentGenerator>,
}

impl ContentWorker {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }

    /// Generate content, converting every error into a failure result.
    ///
    /// The returned result always carries `category` and the location's name.
    pub async fn run(&self, category: ContentCategory, location: &Location) -> ContentResult {
        match self.generator.generate(category, location).await {
            Ok(result) if result.category != category => {
                let err = GenerationError::CategoryMismatch {
                    requested: category.to_string(),
                    received: result.category.to_string(),
                };
                warn!(%category, location = %location.name(), error = %err, "Content agent returned wrong category");
                Self::failure(category, location, &err)
            }
            Ok(mut result) => {
                if result.location_name != location.name() {
                    result.location_name = location.name().to_string();
                }
                debug!(
                    %category,
                    location = %location.name(),
                    score = result.relevance_score.get(),
                    "Content generated"
                );
                result
            }
            Err(err) => {
                warn!(%category, location = %location.name(), error = %err, "Content agent failed");
                Self::failure(category, location, &err)
            }
        }
    }

    pub(crate) fn failure(
        category: ContentCategory,
        location: &Location,
        err: &GenerationError,
    ) -> ContentResult {
        ContentResult::failure(
            category,
            location.name(),
            format!("Error: {} agent failed", category),
            err.to_string(),
            err.to_string(),
            err.kind(),
        )
    }
}
