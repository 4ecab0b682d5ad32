//! Last-in, first-out edge queue (stack).

use crate::edge::BackpressurePolicy;
use crate::queue::shared::{PopEnd, QueueCore};
use crate::queue::counters::{QueueCounters, QueueSnapshot};
use crate::queue::error::QueueResult;
use crate::queue::BoundedQueue;

/// LIFO queue: push onto the top, pop from the top.
///
/// `dropOldest` evicts the bottom of the stack.
pub struct LifoQueue<T> {
    core: QueueCore<T>,
}

impl<T> LifoQueue<T> {
    pub fn new(
        min_capacity: usize,
        max_capacity: usize,
        backpressure: impl Into<BackpressurePolicy>,
    ) -> QueueResult<Self> {
        Ok(Self {
            core: QueueCore::new(min_capacity, max_capacity, backpressure.into())?,
        })
    }

    pub fn min_capacity(&self) -> usize {
        self.core.min_capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.core.max_capacity()
    }

    pub fn backpressure(&self) -> &BackpressurePolicy {
        self.core.backpressure()
    }
}

impl<T: Send> BoundedQueue<T> for LifoQueue<T> {
    fn push(&self, value: T) -> QueueResult<()> {
        self.core.push(value)
    }

    fn pop(&self) -> Option<T> {
        self.core.pop(PopEnd::Back)
    }

    fn len(&self) -> usize {
        self.core.len()
    }

    fn counters(&self) -> QueueCounters {
        self.core.counters()
    }

    fn snapshot(&self) -> QueueSnapshot {
        self.core.snapshot()
    }
}
