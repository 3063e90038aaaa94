//! Shared test fixtures: scripted generators, judges and locations.

use async_trait::async_trait;
use parking_lot::Mutex;
use routeguide::{
    ContentCategory, ContentGenerator, ContentJudge, ContentResult, GenerationError, Location,
    LocationKind, RelevanceScore,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Serializes tests that mutate process environment variables.
pub static ENV_MUTEX: Mutex<()> = parking_lot::const_mutex(());

pub fn location(name: &str, distance_km: f64) -> Location {
    Location::new(
        name,
        32.08,
        34.78,
        format!("{} along the coast road", name),
        LocationKind::Cultural,
        distance_km,
    )
    .unwrap()
}

/// Per-category behaviour of [`ScriptedGenerator`]
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Score(i64),
    Slow(Duration, i64),
    NeverFinishes,
    Fails,
}

/// Generator whose reply depends only on the category
pub struct ScriptedGenerator {
    scripts: HashMap<ContentCategory, Script>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(scripts: &[(ContentCategory, Script)]) -> Self {
        Self {
            scripts: scripts.iter().copied().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        category: ContentCategory,
        location: &Location,
    ) -> Result<ContentResult, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let score = match self.scripts.get(&category).copied().unwrap_or(Script::Score(50)) {
            Script::Score(score) => score,
            Script::Slow(delay, score) => {
                tokio::time::sleep(delay).await;
                score
            }
            Script::NeverFinishes => {
                std::future::pending::<()>().await;
                0
            }
            Script::Fails => {
                return Err(GenerationError::Malformed(
                    "reply was not JSON".to_string(),
                ))
            }
        };
        Ok(ContentResult::new(
            category,
            location.name(),
            format!("{} for {}", category, location.name()),
            "generated",
            RelevanceScore::new(score)?,
        ))
    }
}

/// Judge returning the same raw reply every time
pub struct FixedJudge {
    pub reply: String,
}

#[async_trait]
impl ContentJudge for FixedJudge {
    async fn evaluate(
        &self,
        _location_name: &str,
        _results: &[ContentResult],
    ) -> Result<String, GenerationError> {
        Ok(self.reply.clone())
    }
}
