//! # edgeflow: bounded edge queues and trigger sources
//!
//! Runtime support for compiled dataflow pipelines. The compiler emits an
//! `edges.json` index describing every edge between pipeline stages; this
//! crate turns those descriptors into bounded FIFO/LIFO queues and feeds
//! them from timer, network and filesystem triggers.
//!
//! ## Architecture
//!
//! - **Edge**: descriptor model, `edges.v1` index, derived `bounded`/`delivery`
//! - **Queue**: mutex-protected FIFO/LIFO buffers with backpressure policies
//! - **Trigger**: producer threads emitting [`Event`]s on bounded channels
//! - **Host**: capability policy gating filesystem, network and clock access
//! - **Signal**: per-process OS signal dispatch
//! - **Wiring**: one queue per edge, at most one trigger per queue
//!
//! ## Example
//!
//! ```ignore
//! use edgeflow::{
//!     edge::{EdgeDescriptor, EdgeKind},
//!     queue::{BoundedQueue, EdgeQueue},
//!     host::Host,
//!     trigger::Timer,
//! };
//! use std::time::Duration;
//!
//! let edge = EdgeDescriptor::new(EdgeKind::Fifo, "Clock", 1)
//!     .with_capacity(0, 8)
//!     .with_backpressure("dropOldest");
//! let queue = EdgeQueue::from_descriptor(&edge)?;
//!
//! let timer = Timer::start(&Host::default(), Duration::from_millis(100))?;
//! for tick in timer.events().iter().take(3) {
//!     queue.push(tick)?;
//! }
//! timer.stop();
//! ```

pub mod config;
pub mod edge;
pub mod error;
pub mod event;
pub mod host;
pub mod queue;
pub mod signal;
pub mod trigger;
pub mod wiring;

// Re-export commonly used types
pub use config::{BindingConfig, RuntimeConfig, SourceConfig};
pub use edge::{BackpressurePolicy, Delivery, EdgeDescriptor, EdgeKind, EdgesIndex};
pub use error::{EdgeFlowError, Result, ResultExt};
pub use event::Event;
pub use host::{Capabilities, Host};
pub use queue::{BoundedQueue, EdgeQueue, FifoQueue, LifoQueue, QueueError};
pub use signal::{SignalHub, SignalType};
pub use trigger::{FsWatcher, NetListener, Timer, TriggerError};
pub use wiring::{EdgeRuntime, Payload};
