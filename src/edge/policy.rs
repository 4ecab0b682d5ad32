//! Backpressure policies and delivery semantics.
//!
//! Policies travel as plain strings in compiled artifacts. Anything that is not
//! one of the five known literals is preserved verbatim so it round-trips, and
//! the queue treats it like `dropNewest` on overflow.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule applied when a bounded queue is full.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackpressurePolicy {
    /// Reject the push with a full-queue error.
    #[default]
    Block,
    /// Evict the oldest element, then insert.
    DropOldest,
    /// Discard the incoming element.
    DropNewest,
    /// Alias of `DropOldest`; no secondary sink is wired.
    ShuntOldest,
    /// Alias of `DropNewest`; no secondary sink is wired.
    ShuntNewest,
    /// Unrecognized literal, kept as written.
    Unknown(String),
}

/// What a full queue does with an incoming push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Reject,
    EvictOldest,
    DiscardNewest,
}

impl BackpressurePolicy {
    pub fn as_str(&self) -> &str {
        match self {
            BackpressurePolicy::Block => "block",
            BackpressurePolicy::DropOldest => "dropOldest",
            BackpressurePolicy::DropNewest => "dropNewest",
            BackpressurePolicy::ShuntOldest => "shuntOldest",
            BackpressurePolicy::ShuntNewest => "shuntNewest",
            BackpressurePolicy::Unknown(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, BackpressurePolicy::Unknown(_))
    }

    /// Overflow action for this policy.
    pub fn overflow(&self) -> Overflow {
        match self {
            BackpressurePolicy::Block => Overflow::Reject,
            BackpressurePolicy::DropOldest | BackpressurePolicy::ShuntOldest => {
                Overflow::EvictOldest
            }
            BackpressurePolicy::DropNewest
            | BackpressurePolicy::ShuntNewest
            | BackpressurePolicy::Unknown(_) => Overflow::DiscardNewest,
        }
    }
}

impl From<&str> for BackpressurePolicy {
    fn from(s: &str) -> Self {
        match s {
            "block" => BackpressurePolicy::Block,
            "dropOldest" => BackpressurePolicy::DropOldest,
            "dropNewest" => BackpressurePolicy::DropNewest,
            "shuntOldest" => BackpressurePolicy::ShuntOldest,
            "shuntNewest" => BackpressurePolicy::ShuntNewest,
            other => BackpressurePolicy::Unknown(other.to_string()),
        }
    }
}

impl From<String> for BackpressurePolicy {
    fn from(s: String) -> Self {
        BackpressurePolicy::from(s.as_str())
    }
}

impl From<BackpressurePolicy> for String {
    fn from(p: BackpressurePolicy) -> Self {
        p.as_str().to_string()
    }
}

impl fmt::Display for BackpressurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery guarantee implied by an edge's policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Delivery {
    /// Producer is stopped rather than losing data.
    AtLeastOnce,
    /// Data may be dropped under load.
    BestEffort,
}

impl Delivery {
    pub fn as_str(self) -> &'static str {
        match self {
            Delivery::AtLeastOnce => "atLeastOnce",
            Delivery::BestEffort => "bestEffort",
        }
    }
}

impl fmt::Display for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derive `(bounded, delivery)` from an edge's declared capacity and policy.
///
/// `bounded` is `max_capacity > 0`. Delivery is `atLeastOnce` only for the
/// literal `block` policy; every other value, recognized or not, is
/// `bestEffort`.
pub fn derive_bounded_delivery(
    max_capacity: usize,
    policy: &BackpressurePolicy,
) -> (bool, Delivery) {
    let delivery = if *policy == BackpressurePolicy::Block {
        Delivery::AtLeastOnce
    } else {
        Delivery::BestEffort
    };
    (max_capacity > 0, delivery)
}
