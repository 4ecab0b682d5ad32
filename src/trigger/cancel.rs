//! One-shot cancellation signal shared between a trigger handle and its
//! producer threads.
//!
//! The signal is a channel nobody ever sends on: cancelling drops the only
//! sender, which disconnects every clone of the receiver at once. Producers
//! can wait on it inside `select!` next to a blocking send, or use
//! `recv_timeout` as an interruptible sleep.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Cloneable cancel handle. Cancelling more than once is a no-op.
#[derive(Clone)]
pub struct CancelToken {
    sender: Arc<Mutex<Option<Sender<()>>>>,
    done: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            sender: Arc::new(Mutex::new(Some(tx))),
            done: rx,
        }
    }

    /// Request cancellation. Returns `true` only for the call that cancelled.
    pub fn cancel(&self) -> bool {
        self.sender.lock().take().is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Receiver that becomes ready (disconnected) once cancelled.
    pub fn done(&self) -> &Receiver<()> {
        &self.done
    }

    /// Sleep for `timeout` unless cancelled first. Returns `true` if cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        !matches!(self.done.recv_timeout(timeout), Err(RecvTimeoutError::Timeout))
    }
}
