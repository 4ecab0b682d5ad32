//! Periodic tick trigger.

use super::{emit, CancelToken, TriggerError, TriggerHandle, TriggerResult};
use crate::event::Event;
use crate::host::{Capability, Host};
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, select, tick};
use std::thread;
use std::time::Duration;

/// Output buffer of a timer. A slow consumer stalls the ticker instead of
/// letting ticks pile up.
pub const TIMER_BUFFER: usize = 1;

/// Emits the current wall-clock time every `interval`.
pub struct Timer;

impl Timer {
    /// Start ticking. Spawns exactly one producer thread.
    ///
    /// Gated on [`Capability::Device`], the host's clock.
    pub fn start(host: &Host, interval: Duration) -> TriggerResult<TriggerHandle<DateTime<Utc>>> {
        host.check(Capability::Device)?;
        if interval.is_zero() {
            return Err(TriggerError::InvalidInterval(interval));
        }

        let (tx, rx) = bounded(TIMER_BUFFER);
        let token = CancelToken::new();
        let name = format!("timer-{}ms", interval.as_millis());

        let worker = {
            let token = token.clone();
            thread::Builder::new().name(name.clone()).spawn(move || {
                let ticker = tick(interval);
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            let now = Utc::now();
                            if !emit(&tx, &token, Event::with_timestamp(now, now)) {
                                break;
                            }
                        }
                        recv(token.done()) -> _ => break,
                    }
                }
                tracing::debug!("Timer producer exiting");
            })?
        };

        tracing::info!("Timer started (interval {:?})", interval);
        Ok(TriggerHandle::new(name, rx, token, worker))
    }
}
