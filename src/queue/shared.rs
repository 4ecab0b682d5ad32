//! Shared state and overflow handling for FIFO and LIFO queues.
//!
//! Both disciplines insert at the back of a `VecDeque` and evict from the
//! front (the FIFO head, or the bottom of the LIFO stack). They differ only in
//! which end `pop` takes from.

use crate::edge::{BackpressurePolicy, Overflow};
use crate::queue::counters::{QueueCounters, QueueSnapshot};
use crate::queue::error::{QueueError, QueueResult};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// End of the container that `pop` removes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PopEnd {
    Front,
    Back,
}

struct State<T> {
    items: VecDeque<T>,
    counters: QueueCounters,
}

pub(crate) struct QueueCore<T> {
    min_capacity: usize,
    max_capacity: usize,
    backpressure: BackpressurePolicy,
    state: Mutex<State<T>>,
}

impl<T> QueueCore<T> {
    pub(crate) fn new(
        min_capacity: usize,
        max_capacity: usize,
        backpressure: BackpressurePolicy,
    ) -> QueueResult<Self> {
        if max_capacity > 0 && max_capacity < min_capacity {
            return Err(QueueError::InvalidCapacity {
                min: min_capacity,
                max: max_capacity,
            });
        }
        Ok(Self {
            min_capacity,
            max_capacity,
            backpressure,
            state: Mutex::new(State {
                // minCapacity is a preallocation hint only
                items: VecDeque::with_capacity(min_capacity),
                counters: QueueCounters::default(),
            }),
        })
    }

    pub(crate) fn unbounded() -> Self {
        Self {
            min_capacity: 0,
            max_capacity: 0,
            backpressure: BackpressurePolicy::Block,
            state: Mutex::new(State {
                items: VecDeque::new(),
                counters: QueueCounters::default(),
            }),
        }
    }

    pub(crate) fn push(&self, value: T) -> QueueResult<()> {
        let mut state = self.state.lock();
        state.counters.pushed += 1;

        if self.max_capacity > 0 && state.items.len() >= self.max_capacity {
            match self.backpressure.overflow() {
                Overflow::Reject => {
                    state.counters.full += 1;
                    return Err(QueueError::Full {
                        capacity: self.max_capacity,
                    });
                }
                Overflow::EvictOldest => {
                    state.items.pop_front();
                    state.counters.dropped += 1;
                    tracing::trace!(policy = %self.backpressure, "evicted oldest");
                }
                Overflow::DiscardNewest => {
                    state.counters.dropped += 1;
                    tracing::trace!(policy = %self.backpressure, "discarded newest");
                    return Ok(());
                }
            }
        }

        state.items.push_back(value);
        Ok(())
    }

    pub(crate) fn pop(&self, end: PopEnd) -> Option<T> {
        let mut state = self.state.lock();
        let value = match end {
            PopEnd::Front => state.items.pop_front(),
            PopEnd::Back => state.items.pop_back(),
        };
        if value.is_some() {
            state.counters.popped += 1;
        }
        value
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub(crate) fn counters(&self) -> QueueCounters {
        self.state.lock().counters
    }

    pub(crate) fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock();
        QueueSnapshot {
            len: state.items.len(),
            counters: state.counters,
        }
    }

    pub(crate) fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    pub(crate) fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub(crate) fn backpressure(&self) -> &BackpressurePolicy {
        &self.backpressure
    }
}
