//! Running queue counters.

use serde::Serialize;

/// Monotonic counters of a queue, read as one consistent snapshot.
///
/// At any point with no operation in flight:
/// `pushed == popped + dropped + full + len`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueCounters {
    /// Every push attempt, accepted or not.
    pub pushed: u64,
    /// Successful pops.
    pub popped: u64,
    /// Values evicted (dropOldest) or discarded (dropNewest).
    pub dropped: u64,
    /// Pushes rejected by a full `block` queue.
    pub full: u64,
}

impl QueueCounters {
    /// Whether the counters account for exactly `len` queued values.
    pub fn is_balanced(&self, len: usize) -> bool {
        self.pushed == self.popped + self.dropped + self.full + len as u64
    }
}

/// Length and counters taken under the same lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub len: usize,
    #[serde(flatten)]
    pub counters: QueueCounters,
}

impl QueueSnapshot {
    pub fn is_balanced(&self) -> bool {
        self.counters.is_balanced(self.len)
    }
}
