//! Event envelope carried from triggers into edge queues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value paired with the wall-clock time it was captured.
///
/// Timestamps are for observability; they carry no ordering guarantee across
/// independent sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T> {
    pub value: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> Event<T> {
    /// Wrap `value`, stamped now.
    pub fn new(value: T) -> Self {
        Self {
            value,
            timestamp: Utc::now(),
        }
    }

    pub fn with_timestamp(value: T, timestamp: DateTime<Utc>) -> Self {
        Self { value, timestamp }
    }

    /// Unwrap into the carried value.
    pub fn into_value(self) -> T {
        self.value
    }
}
