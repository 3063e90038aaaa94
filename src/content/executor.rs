//! Fan-out executor: one spawned task per category, a shared deadline, and
//! failure substitution so every location yields exactly one result per category.

use super::{ContentGenerator, ContentWorker};
use crate::config::PipelineConfig;
use crate::types::{ContentCategory, ContentResult, Location};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info, warn};

/// Fan-out output for one location, results in category order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationResults {
    pub location: Location,
    pub results: Vec<ContentResult>,
}

/// Aborts every task it still holds when dropped, so a cancelled fan-out
/// leaves no detached workers behind.
struct AbortOnDrop(Vec<(ContentCategory, JoinHandle<ContentResult>)>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for (_, handle) in &self.0 {
            handle.abort();
        }
    }
}

/// Launches one worker per configured category and collects their results
/// under a single deadline.
pub struct FanOutExecutor {
    worker: ContentWorker,
    categories: Vec<ContentCategory>,
    timeout: Duration,
}

impl FanOutExecutor {
    pub fn new(generator: Arc<dyn ContentGenerator>, config: &PipelineConfig) -> Self {
        Self {
            worker: ContentWorker::new(generator),
            categories: config.categories.clone(),
            timeout: config.content_timeout(),
        }
    }

    /// Shared deadline applied to each location's fan-out
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn categories(&self) -> &[ContentCategory] {
        &self.categories
    }

    /// Fan out every category for `location`.
    ///
    /// Always returns exactly `categories().len()` results in category order.
    /// Tasks still running at the deadline are aborted and replaced by timeout
    /// results; a panicking task is replaced by a failure result.
    pub async fn process(&self, location: &Location) -> Vec<ContentResult> {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!(location = %location.name(), error = %e, "Cannot spawn content tasks");
                return self.synthesized_failures(location, &e.to_string());
            }
        };

        let deadline = Instant::now() + self.timeout;
        let mut tasks = AbortOnDrop(
            self.categories
                .iter()
                .map(|&category| {
                    let worker = self.worker.clone();
                    let location = location.clone();
                    let handle =
                        runtime.spawn(async move { worker.run(category, &location).await });
                    (category, handle)
                })
                .collect(),
        );

        let mut results = Vec::with_capacity(tasks.0.len());
        let mut timed_out = 0usize;
        for (category, handle) in tasks.0.iter_mut() {
            let category = *category;
            let result = match timeout_at(deadline, &mut *handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_error)) => {
                    error!(
                        %category,
                        location = %location.name(),
                        error = %join_error,
                        "Content task crashed"
                    );
                    ContentResult::failure(
                        category,
                        location.name(),
                        format!("Error: {} agent failed", category),
                        "Agent task terminated abnormally",
                        join_error.to_string(),
                        if join_error.is_panic() { "panic" } else { "cancelled" },
                    )
                }
                Err(_) => {
                    handle.abort();
                    timed_out += 1;
                    ContentResult::timeout(category, location.name(), self.timeout)
                }
            };
            results.push(result);
        }

        if timed_out > 0 {
            warn!(
                location = %location.name(),
                timed_out,
                timeout_ms = self.timeout.as_millis() as u64,
                "Content tasks exceeded deadline"
            );
        }
        info!(
            location = %location.name(),
            total = results.len(),
            failed = results.iter().filter(|r| r.is_failure()).count(),
            "Fan-out complete"
        );
        results
    }

    /// Process locations one at a time, in input order.
    pub async fn process_all(&self, locations: &[Location]) -> Vec<LocationResults> {
        let mut all = Vec::with_capacity(locations.len());
        for location in locations {
            let results = self.process(location).await;
            all.push(LocationResults {
                location: location.clone(),
                results,
            });
        }
        all
    }

    /// Process locations with up to `width` fan-outs in flight at once.
    ///
    /// Output order matches input order regardless of completion order.
    pub async fn process_all_batched(
        &self,
        locations: &[Location],
        width: usize,
    ) -> Vec<LocationResults> {
        stream::iter(locations)
            .map(|location| async move {
                LocationResults {
                    location: location.clone(),
                    results: self.process(location).await,
                }
            })
            .buffered(width.max(1))
            .collect()
            .await
    }

    fn synthesized_failures(&self, location: &Location, reason: &str) -> Vec<ContentResult> {
        self.categories
            .iter()
            .map(|&category| {
                ContentResult::failure(
                    category,
                    location.name(),
                    format!("Error: {} agent failed", category),
                    format!("Content tasks could not be started: {}", reason),
                    reason,
                    "executor",
                )
            })
            .collect()
    }
}
