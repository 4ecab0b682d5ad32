//! Channel helpers for trigger tests

use crossbeam_channel::Receiver;
use edgeflow::Event;
use std::time::{Duration, Instant};

/// Collect events until `count` arrive or `timeout` passes.
pub fn collect_events<T>(rx: &Receiver<Event<T>>, count: usize, timeout: Duration) -> Vec<Event<T>> {
    let deadline = Instant::now() + timeout;
    let mut out = Vec::with_capacity(count);
    while out.len() < count {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match rx.recv_timeout(remaining) {
            Ok(ev) => out.push(ev),
            Err(_) => break,
        }
    }
    out
}

/// Block until the channel disconnects, returning how many events were still buffered.
pub fn drain_until_closed<T>(rx: &Receiver<Event<T>>, timeout: Duration) -> Option<usize> {
    let deadline = Instant::now() + timeout;
    let mut n = 0;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(_) => n += 1,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => return Some(n),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => return None,
        }
    }
}
