//! Queue error types.

use thiserror::Error;

/// Errors returned synchronously by queue operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Push rejected by a full `block`-policy queue. The value was not inserted.
    #[error("queue full (capacity {capacity})")]
    Full { capacity: usize },

    #[error("invalid capacity: maxCapacity {max} < minCapacity {min}")]
    InvalidCapacity { min: usize, max: usize },
}

impl QueueError {
    pub fn is_full(&self) -> bool {
        matches!(self, QueueError::Full { .. })
    }
}

pub type QueueResult<T> = std::result::Result<T, QueueError>;
