//! Error handling for edgeflow
//!
//! Each subsystem owns a focused error enum (`QueueError`, `TriggerError`,
//! `EdgeError`). This module folds them into a crate-level error and a Result
//! alias for callers that work across subsystems, such as the runtime host.

use crate::edge::EdgeError;
use crate::queue::QueueError;
use crate::trigger::TriggerError;
use thiserror::Error;

/// Main error type for edgeflow operations
#[derive(Error, Debug)]
pub enum EdgeFlowError {
    /// Errors raised by a bounded queue
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Errors raised while opening or running a trigger source
    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    /// Errors related to edge descriptors and the edges index
    #[error("Edge error: {0}")]
    Edge(#[from] EdgeError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to OS signal registration
    #[error("Signal error: {0}")]
    Signal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EdgeFlowError>,
    },
}

impl EdgeFlowError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EdgeFlowError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for edgeflow operations
pub type Result<T> = std::result::Result<T, EdgeFlowError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<EdgeFlowError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
