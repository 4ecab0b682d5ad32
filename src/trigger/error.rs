//! Trigger-specific error types.

use crate::host::CapabilityDenied;
use std::time::Duration;
use thiserror::Error;

/// Errors raised when opening a trigger source.
#[derive(Error, Debug)]
pub enum TriggerError {
    /// The host policy forbids the access this trigger needs.
    #[error(transparent)]
    CapabilityDenied(#[from] CapabilityDenied),

    /// Declared but unsupported source, such as ICMP listeners.
    #[error("{0} not implemented")]
    NotImplemented(String),

    #[error("invalid interval: {0:?}")]
    InvalidInterval(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TriggerError {
    pub fn is_capability_denied(&self) -> bool {
        matches!(self, TriggerError::CapabilityDenied(_))
    }
}

pub type TriggerResult<T> = std::result::Result<T, TriggerError>;
