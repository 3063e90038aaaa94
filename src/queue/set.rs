//! The three stage hand-off queues: pending locations, content results, judgments.

use super::{BoundedQueue, QueueMode};
use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::types::{ContentResult, Judgment, Location};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Depth snapshot for one queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueDepth {
    pub depth: usize,
    pub capacity: usize,
}

/// Depth snapshot for all three queues.
///
/// Depths are read one queue at a time and can be stale by the time they are
/// inspected; treat them as an observability signal only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: QueueDepth,
    pub results: QueueDepth,
    pub judgments: QueueDepth,
}

/// Items discarded by [`QueueSet::clear_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub locations: usize,
    pub results: usize,
    pub judgments: usize,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.locations + self.results + self.judgments
    }
}

/// Bounded queues connecting the pipeline stages
pub struct QueueSet {
    pending: BoundedQueue<Location>,
    results: BoundedQueue<ContentResult>,
    judgments: BoundedQueue<Judgment>,
}

impl QueueSet {
    pub fn new(config: &QueueConfig) -> Self {
        info!(
            pending = config.pending_capacity,
            results = config.results_capacity,
            judgments = config.judgment_capacity,
            "Queue set initialized"
        );
        Self {
            pending: BoundedQueue::new("pending", config.pending_capacity),
            results: BoundedQueue::new("results", config.results_capacity),
            judgments: BoundedQueue::new("judgments", config.judgment_capacity),
        }
    }

    pub fn pending(&self) -> &BoundedQueue<Location> {
        &self.pending
    }

    pub fn results(&self) -> &BoundedQueue<ContentResult> {
        &self.results
    }

    pub fn judgments(&self) -> &BoundedQueue<Judgment> {
        &self.judgments
    }

    pub async fn put_location(&self, location: Location, mode: QueueMode) -> Result<(), QueueError> {
        let name = location.name().to_string();
        self.pending.put(location, mode).await?;
        debug!(location = %name, "Location enqueued");
        Ok(())
    }

    pub async fn get_location(&self, mode: QueueMode) -> Result<Location, QueueError> {
        let location = self.pending.get(mode).await?;
        debug!(location = %location.name(), "Location dequeued");
        Ok(location)
    }

    pub async fn put_result(&self, result: ContentResult, mode: QueueMode) -> Result<(), QueueError> {
        let category = result.category;
        let location = result.location_name.clone();
        self.results.put(result, mode).await?;
        debug!(%category, location = %location, "Result enqueued");
        Ok(())
    }

    pub async fn get_result(&self, mode: QueueMode) -> Result<ContentResult, QueueError> {
        let result = self.results.get(mode).await?;
        debug!(category = %result.category, location = %result.location_name, "Result dequeued");
        Ok(result)
    }

    pub async fn put_judgment(&self, judgment: Judgment, mode: QueueMode) -> Result<(), QueueError> {
        let category = judgment.selected_category();
        let location = judgment.location().to_string();
        self.judgments.put(judgment, mode).await?;
        debug!(selected = %category, location = %location, "Judgment enqueued");
        Ok(())
    }

    pub async fn get_judgment(&self, mode: QueueMode) -> Result<Judgment, QueueError> {
        let judgment = self.judgments.get(mode).await?;
        debug!(
            selected = %judgment.selected_category(),
            location = %judgment.location(),
            "Judgment dequeued"
        );
        Ok(judgment)
    }

    /// Drain all three queues. Callers must make sure no producer is active.
    pub fn clear_all(&self) -> DrainReport {
        let report = DrainReport {
            locations: self.pending.drain(),
            results: self.results.drain(),
            judgments: self.judgments.drain(),
        };
        info!(
            locations = report.locations,
            results = report.results,
            judgments = report.judgments,
            "Queues cleared"
        );
        report
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pending: depth_of(&self.pending),
            results: depth_of(&self.results),
            judgments: depth_of(&self.judgments),
        }
    }
}

fn depth_of<T>(queue: &BoundedQueue<T>) -> QueueDepth {
    QueueDepth {
        depth: queue.len(),
        capacity: queue.capacity(),
    }
}

impl fmt::Display for QueueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        write!(
            f,
            "QueueSet(pending={}/{}, results={}/{}, judgments={}/{})",
            stats.pending.depth,
            stats.pending.capacity,
            stats.results.depth,
            stats.results.capacity,
            stats.judgments.depth,
            stats.judgments.capacity
        )
    }
}
