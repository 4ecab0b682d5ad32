//! Trigger sources.
//!
//! A trigger owns one or more producer threads and hands out the receiving
//! end of a bounded channel of [`Event`]s. Cancelling a trigger asks its
//! producers to stop; each producer drops its sender on exit, so the channel
//! disconnects only after the last in-flight send has finished.
//!
//! ```text
//! Timer ───┐
//! Net ─────┼──▶ Receiver<Event<T>> ──▶ consumer / pump ──▶ EdgeQueue
//! Watch ───┘
//! ```

pub mod cancel;
pub mod error;
pub mod net;
pub mod timer;
pub mod watch;

pub use cancel::CancelToken;
pub use error::{TriggerError, TriggerResult};
pub use net::{NetListener, NetMessage, NetOptions, NetProtocol};
pub use timer::Timer;
pub use watch::{FsEvent, FsEventKind, FsWatcher};

use crate::event::Event;
use crossbeam_channel::{select, Receiver, Sender};
use std::thread::JoinHandle;

/// Anything that produces a cancellable stream of events.
pub trait EventSource<T> {
    fn events(&self) -> &Receiver<Event<T>>;

    /// Request stop. Idempotent.
    fn cancel(&self);
}

/// Handle to a single-threaded trigger (timer, watcher).
///
/// Dropping the handle cancels the trigger and joins its producer.
pub struct TriggerHandle<T> {
    name: String,
    events: Receiver<Event<T>>,
    token: CancelToken,
    worker: Option<JoinHandle<()>>,
}

impl<T> TriggerHandle<T> {
    pub(crate) fn new(
        name: String,
        events: Receiver<Event<T>>,
        token: CancelToken,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            name,
            events,
            token,
            worker: Some(worker),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn events(&self) -> &Receiver<Event<T>> {
        &self.events
    }

    /// A cancel handle that can be moved to another thread.
    pub fn canceller(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        if self.token.cancel() {
            tracing::debug!("Cancel requested for {}", self.name);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the producer thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.cancel();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("{} producer thread panicked", self.name);
            }
        }
    }
}

impl<T> EventSource<T> for TriggerHandle<T> {
    fn events(&self) -> &Receiver<Event<T>> {
        TriggerHandle::events(self)
    }

    fn cancel(&self) {
        TriggerHandle::cancel(self)
    }
}

impl<T> Drop for TriggerHandle<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Send `event`, blocking while the channel is full, unless cancelled first.
///
/// Returns `false` when the producer should exit: cancelled, or every
/// receiver is gone.
pub(crate) fn emit<T>(tx: &Sender<Event<T>>, token: &CancelToken, event: Event<T>) -> bool {
    if token.is_cancelled() {
        return false;
    }
    select! {
        send(tx, event) -> res => res.is_ok(),
        recv(token.done()) -> _ => false,
    }
}
