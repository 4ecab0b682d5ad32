//! Bounded edge queues.
//!
//! Passive, thread-safe buffers that sit between pipeline stages. A queue never
//! spawns threads and never blocks: a full `block`-policy queue rejects the
//! push with [`QueueError::Full`] and leaves retry to the caller.
//!
//! Two-layer design:
//! - **`BoundedQueue` trait**: the shared push/pop/len/counters contract.
//! - **`EdgeQueue` enum**: FIFO or LIFO chosen from an [`EdgeDescriptor`],
//!   dispatched by match instead of a trait object.
//!
//! # Accounting
//!
//! Every push increments `pushed`; the outcome then lands in exactly one of
//! `full` (rejected), `dropped` (discarded, or evicted an older value) or the
//! container. With no operation in flight:
//!
//! ```text
//! pushed == popped + dropped + full + len
//! ```

pub mod counters;
pub mod error;
pub mod fifo;
pub mod lifo;

mod shared;

pub use counters::{QueueCounters, QueueSnapshot};
pub use error::{QueueError, QueueResult};
pub use fifo::FifoQueue;
pub use lifo::LifoQueue;

use crate::edge::{BackpressurePolicy, EdgeDescriptor, EdgeKind};

/// Contract shared by FIFO and LIFO queues.
pub trait BoundedQueue<T>: Send + Sync {
    /// Insert a value, resolving overflow by the queue's backpressure policy.
    fn push(&self, value: T) -> QueueResult<()>;

    /// Remove the next value. `None` when empty.
    fn pop(&self) -> Option<T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn counters(&self) -> QueueCounters;

    /// Length and counters read under one lock.
    fn snapshot(&self) -> QueueSnapshot;
}

/// Queue instantiated from an edge descriptor.
pub enum EdgeQueue<T> {
    Fifo(FifoQueue<T>),
    Lifo(LifoQueue<T>),
}

impl<T> EdgeQueue<T> {
    /// Build the queue an edge declares.
    ///
    /// `edge.LIFO` yields a stack; `edge.FIFO`, `edge.Pipeline` and
    /// `edge.MultiPath` yield FIFO buffers.
    pub fn from_descriptor(edge: &EdgeDescriptor) -> QueueResult<Self> {
        let (min, max) = (edge.min_capacity, edge.max_capacity);
        let policy = edge.backpressure.clone();
        Ok(match edge.kind {
            EdgeKind::Lifo => EdgeQueue::Lifo(LifoQueue::new(min, max, policy)?),
            EdgeKind::Fifo | EdgeKind::Pipeline | EdgeKind::MultiPath => {
                EdgeQueue::Fifo(FifoQueue::new(min, max, policy)?)
            }
        })
    }

    pub fn kind(&self) -> EdgeKind {
        match self {
            EdgeQueue::Fifo(_) => EdgeKind::Fifo,
            EdgeQueue::Lifo(_) => EdgeKind::Lifo,
        }
    }

    pub fn min_capacity(&self) -> usize {
        match self {
            EdgeQueue::Fifo(q) => q.min_capacity(),
            EdgeQueue::Lifo(q) => q.min_capacity(),
        }
    }

    pub fn max_capacity(&self) -> usize {
        match self {
            EdgeQueue::Fifo(q) => q.max_capacity(),
            EdgeQueue::Lifo(q) => q.max_capacity(),
        }
    }

    pub fn backpressure(&self) -> &BackpressurePolicy {
        match self {
            EdgeQueue::Fifo(q) => q.backpressure(),
            EdgeQueue::Lifo(q) => q.backpressure(),
        }
    }
}

impl<T: Send> BoundedQueue<T> for EdgeQueue<T> {
    fn push(&self, value: T) -> QueueResult<()> {
        match self {
            EdgeQueue::Fifo(q) => q.push(value),
            EdgeQueue::Lifo(q) => q.push(value),
        }
    }

    fn pop(&self) -> Option<T> {
        match self {
            EdgeQueue::Fifo(q) => q.pop(),
            EdgeQueue::Lifo(q) => q.pop(),
        }
    }

    fn len(&self) -> usize {
        match self {
            EdgeQueue::Fifo(q) => q.len(),
            EdgeQueue::Lifo(q) => q.len(),
        }
    }

    fn counters(&self) -> QueueCounters {
        match self {
            EdgeQueue::Fifo(q) => q.counters(),
            EdgeQueue::Lifo(q) => q.counters(),
        }
    }

    fn snapshot(&self) -> QueueSnapshot {
        match self {
            EdgeQueue::Fifo(q) => q.snapshot(),
            EdgeQueue::Lifo(q) => q.snapshot(),
        }
    }
}
