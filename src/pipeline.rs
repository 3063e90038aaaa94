//! Pipeline orchestrator: locations in, one judgment per location out.
//!
//! Every location travels through the three bounded queues: it is put on
//! `pending` and taken off, its fan-out results are put on `results` and taken
//! off for selection, and the judgment is put on `judgments`. Each location's
//! results are drained before the next location is processed, so a results
//! queue that holds one full fan-out is enough to never block on itself.
//!
//! A pipeline instance is meant for one run at a time. `run` and `run_batched`
//! refuse to start while any queue holds leftovers, such as judgments left by
//! `run_from_queue`; call [`ContentPipeline::clear`] between independent runs.

use crate::config::RouteGuideConfig;
use crate::content::{ContentGenerator, FanOutExecutor, LocationResults};
use crate::error::{PipelineError, QueueError};
use crate::judge::{fallback_selection, ContentJudge, Selector};
use crate::queue::{DrainReport, QueueMode, QueueSet, QueueStats};
use crate::types::{ContentCategory, ContentResult, Judgment, Location};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Observability snapshot
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub queues: QueueStats,
    pub executor_timeout: Duration,
    pub categories: Vec<ContentCategory>,
}

/// Sequences fan-out, selection and the queue hand-offs.
pub struct ContentPipeline {
    queues: QueueSet,
    executor: FanOutExecutor,
    selector: Selector,
    queue_mode: QueueMode,
    batch_size: usize,
}

impl ContentPipeline {
    /// Build a pipeline from validated configuration.
    ///
    /// Without a judge every multi-option location uses fallback selection.
    pub fn new(
        config: &RouteGuideConfig,
        generator: Arc<dyn ContentGenerator>,
        judge: Option<Arc<dyn ContentJudge>>,
    ) -> Result<Self, PipelineError> {
        config.ensure_valid()?;

        let executor = FanOutExecutor::new(generator, &config.pipeline);
        let selector = Selector::new(judge, config.pipeline.judge_timeout());
        info!(
            categories = executor.categories().len(),
            content_timeout_ms = config.pipeline.content_timeout_ms,
            judge = selector.has_judge(),
            "Content pipeline initialized"
        );

        Ok(Self {
            queues: QueueSet::new(&config.queues),
            executor,
            selector,
            queue_mode: QueueMode::BlockingFor(config.queues.operation_timeout()),
            batch_size: config.pipeline.batch_size,
        })
    }

    pub fn queues(&self) -> &QueueSet {
        &self.queues
    }

    pub fn executor(&self) -> &FanOutExecutor {
        &self.executor
    }

    /// Process locations one at a time; judgments come back in input order.
    ///
    /// Fails with [`PipelineError::QueuesNotIdle`] when any queue still holds
    /// items from an earlier run.
    pub async fn run(&self, locations: &[Location]) -> Result<Vec<Judgment>, PipelineError> {
        if locations.is_empty() {
            warn!("No locations provided to pipeline");
            return Ok(Vec::new());
        }
        self.ensure_idle()?;
        info!(locations = locations.len(), "Starting pipeline");

        let mut judgments = Vec::with_capacity(locations.len());
        for location in locations {
            self.queues
                .put_location(location.clone(), self.queue_mode)
                .await?;
            let location = self.take_location(location).await?;
            let results = self.executor.process(&location).await;
            if let Some(judgment) = self.select_for(&location, results).await? {
                judgments.push(self.hand_off(judgment).await?);
            }
        }

        info!(judgments = judgments.len(), "Pipeline complete");
        Ok(judgments)
    }

    /// Like [`run`](Self::run), but up to `batch_size` fan-outs run concurrently.
    ///
    /// Judgments are still returned in input order.
    pub async fn run_batched(&self, locations: &[Location]) -> Result<Vec<Judgment>, PipelineError> {
        if locations.is_empty() {
            warn!("No locations provided to pipeline");
            return Ok(Vec::new());
        }
        self.ensure_idle()?;
        let width = self.batch_size.min(self.queues.pending().capacity()).max(1);
        info!(locations = locations.len(), width, "Starting batched pipeline");

        let mut judgments = Vec::with_capacity(locations.len());
        for batch in locations.chunks(width) {
            for location in batch {
                self.queues
                    .put_location(location.clone(), self.queue_mode)
                    .await?;
            }
            let mut dequeued = Vec::with_capacity(batch.len());
            for location in batch {
                dequeued.push(self.take_location(location).await?);
            }

            let processed = self.executor.process_all_batched(&dequeued, width).await;
            for LocationResults { location, results } in processed {
                if let Some(judgment) = self.select_for(&location, results).await? {
                    judgments.push(self.hand_off(judgment).await?);
                }
            }
        }

        info!(judgments = judgments.len(), "Batched pipeline complete");
        Ok(judgments)
    }

    /// Queue locations for [`run_from_queue`](Self::run_from_queue).
    ///
    /// Blocks up to the queue operation timeout per location when `pending` is full.
    pub async fn enqueue_locations(&self, locations: &[Location]) -> Result<usize, PipelineError> {
        for location in locations {
            self.queues
                .put_location(location.clone(), self.queue_mode)
                .await?;
        }
        info!(enqueued = locations.len(), "Locations enqueued");
        Ok(locations.len())
    }

    /// Consume up to `count` locations from `pending`.
    ///
    /// Stops early, without error, once `pending` stays empty past the queue
    /// timeout. Judgments are left on the `judgments` queue for downstream
    /// consumers and also returned. If `judgments` stays full past the queue
    /// timeout the run stops there: everything judged so far is returned, the
    /// last judgment without having been queued.
    pub async fn run_from_queue(&self, count: usize) -> Result<Vec<Judgment>, PipelineError> {
        info!(count, "Starting queue-driven pipeline");
        let mut judgments = Vec::new();

        for index in 0..count {
            let location = match self.queues.get_location(self.queue_mode).await {
                Ok(location) => location,
                Err(QueueError::Empty { .. }) => {
                    info!(processed = index, requested = count, "Pending queue exhausted");
                    break;
                }
                Err(e) => return Err(e.into()),
            };
            info!(
                location = %location.name(),
                position = index + 1,
                count,
                "Processing queued location"
            );
            let results = self.executor.process(&location).await;
            let Some(judgment) = self.select_for(&location, results).await? else {
                continue;
            };

            match self.queues.put_judgment(judgment.clone(), self.queue_mode).await {
                Ok(()) => judgments.push(judgment),
                Err(e @ QueueError::Full { .. }) => {
                    error!(
                        location = %location.name(),
                        error = %e,
                        "Judgment queue full, stopping queue-driven pipeline"
                    );
                    judgments.push(judgment);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(judgments = judgments.len(), "Queue-driven pipeline complete");
        Ok(judgments)
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            queues: self.queues.stats(),
            executor_timeout: self.executor.timeout(),
            categories: self.executor.categories().to_vec(),
        }
    }

    /// Drain all three queues. Must not run concurrently with a pipeline run.
    pub fn clear(&self) -> DrainReport {
        info!("Clearing pipeline queues");
        self.queues.clear_all()
    }

    fn ensure_idle(&self) -> Result<(), PipelineError> {
        let stats = self.queues.stats();
        let (pending, results, judgments) = (
            stats.pending.depth,
            stats.results.depth,
            stats.judgments.depth,
        );
        if pending + results + judgments > 0 {
            warn!(pending, results, judgments, "Refusing to start run on non-empty queues");
            return Err(PipelineError::QueuesNotIdle {
                pending,
                results,
                judgments,
            });
        }
        Ok(())
    }

    /// Take the next location off `pending`; it must be `expected`.
    async fn take_location(&self, expected: &Location) -> Result<Location, PipelineError> {
        let location = self.queues.get_location(self.queue_mode).await?;
        if location.name() != expected.name() {
            return Err(PipelineError::LocationMismatch {
                expected: expected.name().to_string(),
                found: location.name().to_string(),
            });
        }
        Ok(location)
    }

    /// Pass a judgment through `judgments` and take it back off.
    async fn hand_off(&self, judgment: Judgment) -> Result<Judgment, PipelineError> {
        self.queues
            .put_judgment(judgment.clone(), self.queue_mode)
            .await?;
        let queued = self.queues.get_judgment(self.queue_mode).await?;
        if queued.location() != judgment.location() {
            return Err(PipelineError::LocationMismatch {
                expected: judgment.location().to_string(),
                found: queued.location().to_string(),
            });
        }
        Ok(judgment)
    }

    /// Route one location's results through `results` and select.
    /// Returns `None` when there is nothing to judge.
    async fn select_for(
        &self,
        location: &Location,
        results: Vec<ContentResult>,
    ) -> Result<Option<Judgment>, PipelineError> {
        if results.is_empty() {
            warn!(location = %location.name(), "No content results, skipping location");
            return Ok(None);
        }

        let expected = results.len();
        for result in results {
            self.queues.put_result(result, self.queue_mode).await?;
        }
        let mut collected = Vec::with_capacity(expected);
        for _ in 0..expected {
            collected.push(self.queues.get_result(self.queue_mode).await?);
        }

        let judgment = match self.selector.select(collected.clone()).await {
            Ok(judgment) => judgment,
            Err(e) => {
                error!(location = %location.name(), error = %e, "Selection failed, using fallback judgment");
                fallback_selection(collected, Some(&format!("selection failed: {}", e)))?
            }
        };
        info!(
            location = %location.name(),
            selected = %judgment.selected_category(),
            method = ?judgment.method(),
            "Location judged"
        );
        Ok(Some(judgment))
    }
}
