//! Bounded Queues
//!
//! Fixed-capacity FIFO queues used as the hand-off between pipeline stages. A full
//! queue applies backpressure: producers block (or are rejected) until a consumer
//! makes room.

use crate::error::QueueError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

mod set;

pub use set::{DrainReport, QueueDepth, QueueSet, QueueStats};

/// Blocking behaviour for a single `put`/`get`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// Fail immediately when the operation cannot proceed
    NonBlocking,
    /// Wait as long as it takes
    Blocking,
    /// Wait up to the given duration, then fail
    BlockingFor(Duration),
}

impl QueueMode {
    /// Map the classic `(block, timeout)` pair onto a mode.
    pub fn from_parts(block: bool, timeout: Option<Duration>) -> Self {
        match (block, timeout) {
            (false, _) => QueueMode::NonBlocking,
            (true, None) => QueueMode::Blocking,
            (true, Some(timeout)) => QueueMode::BlockingFor(timeout),
        }
    }
}

/// Outcome of waiting for a queue signal
enum Wait {
    Retry,
    GiveUp,
}

/// Fixed-capacity FIFO queue shared between tasks
pub struct BoundedQueue<T> {
    name: &'static str,
    capacity: usize,
    items: Mutex<VecDeque<T>>,
    not_empty: Notify,
    not_full: Notify,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items (minimum 1).
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name,
            capacity,
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Notify::new(),
            not_full: Notify::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current depth. A snapshot only: concurrent producers and consumers may
    /// change it before the caller looks at the value.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Append `item`, waiting for space according to `mode`.
    pub async fn put(&self, item: T, mode: QueueMode) -> Result<(), QueueError> {
        let deadline = deadline_for(mode);
        let mut item = item;
        loop {
            match self.try_put(item) {
                Ok(()) => return Ok(()),
                Err(returned) => item = returned,
            }
            if let Wait::GiveUp = wait_for(&self.not_full, mode, deadline).await {
                return Err(QueueError::Full {
                    queue: self.name,
                    capacity: self.capacity,
                });
            }
        }
    }

    /// Remove the oldest item, waiting for one according to `mode`.
    pub async fn get(&self, mode: QueueMode) -> Result<T, QueueError> {
        let deadline = deadline_for(mode);
        loop {
            if let Some(item) = self.try_get() {
                return Ok(item);
            }
            if let Wait::GiveUp = wait_for(&self.not_empty, mode, deadline).await {
                return Err(QueueError::Empty { queue: self.name });
            }
        }
    }

    /// Append without waiting; hands the item back when the queue is full.
    pub fn try_put(&self, item: T) -> Result<(), T> {
        let mut items = self.items.lock();
        if items.len() >= self.capacity {
            return Err(item);
        }
        items.push_back(item);
        drop(items);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Remove the oldest item without waiting.
    pub fn try_get(&self) -> Option<T> {
        let item = self.items.lock().pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Discard everything currently queued and return how many items were dropped.
    ///
    /// Only safe to rely on when no other producer is active: items put while the
    /// drain runs may or may not survive it.
    pub fn drain(&self) -> usize {
        let drained = {
            let mut items = self.items.lock();
            let count = items.len();
            items.clear();
            count
        };
        if drained > 0 {
            self.not_full.notify_waiters();
        }
        drained
    }
}

fn deadline_for(mode: QueueMode) -> Option<Instant> {
    match mode {
        QueueMode::BlockingFor(timeout) => Some(Instant::now() + timeout),
        _ => None,
    }
}

async fn wait_for(signal: &Notify, mode: QueueMode, deadline: Option<Instant>) -> Wait {
    match (mode, deadline) {
        (QueueMode::NonBlocking, _) => Wait::GiveUp,
        (QueueMode::Blocking, _) => {
            signal.notified().await;
            Wait::Retry
        }
        (QueueMode::BlockingFor(_), Some(deadline)) => {
            if Instant::now() >= deadline {
                return Wait::GiveUp;
            }
            // On expiry, retry once more; the next wait gives up.
            let _ = tokio::time::timeout_at(deadline, signal.notified()).await;
            Wait::Retry
        }
        (QueueMode::BlockingFor(_), None) => Wait::GiveUp,
    }
}
