//! OS signal dispatch.
//!
//! A [`SignalHub`] is an ordinary value owned by whoever needs it (usually
//! `main`) and passed by reference. The OS hook for a signal is installed the
//! first time a handler is registered for it; one background thread turns
//! delivered signals into [`SignalHub::dispatch`] calls. A panicking handler
//! is logged and does not stop the remaining handlers.

use crate::error::{EdgeFlowError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalType {
    Interrupt,
    Terminate,
    Hangup,
    Quit,
}

impl SignalType {
    pub const ALL: [SignalType; 4] = [
        SignalType::Interrupt,
        SignalType::Terminate,
        SignalType::Hangup,
        SignalType::Quit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SignalType::Interrupt => "SIGINT",
            SignalType::Terminate => "SIGTERM",
            SignalType::Hangup => "SIGHUP",
            SignalType::Quit => "SIGQUIT",
        }
    }

    #[cfg(unix)]
    pub fn raw(&self) -> std::os::raw::c_int {
        use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
        match self {
            SignalType::Interrupt => SIGINT,
            SignalType::Terminate => SIGTERM,
            SignalType::Hangup => SIGHUP,
            SignalType::Quit => SIGQUIT,
        }
    }

    #[cfg(unix)]
    pub fn from_raw(raw: std::os::raw::c_int) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.raw() == raw)
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type SignalHandler = Arc<dyn Fn(SignalType) + Send + Sync>;

#[cfg(unix)]
struct OsListener {
    handle: signal_hook::iterator::Handle,
    installed: std::collections::HashSet<SignalType>,
    thread: Option<std::thread::JoinHandle<()>>,
}

#[cfg(unix)]
impl OsListener {
    fn start(hub: Weak<SignalHub>, first: SignalType) -> std::io::Result<Self> {
        let mut signals = signal_hook::iterator::Signals::new([first.raw()])?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("signal-hub".to_string())
            .spawn(move || {
                for raw in signals.forever() {
                    let Some(sig) = SignalType::from_raw(raw) else {
                        continue;
                    };
                    match hub.upgrade() {
                        Some(hub) => {
                            hub.dispatch(sig);
                        }
                        None => break,
                    }
                }
                tracing::debug!("Signal listener exiting");
            })?;
        Ok(Self {
            handle,
            installed: std::iter::once(first).collect(),
            thread: Some(thread),
        })
    }

    fn install(&mut self, sig: SignalType) -> std::io::Result<()> {
        if self.installed.insert(sig) {
            self.handle.add_signal(sig.raw())?;
        }
        Ok(())
    }
}

#[cfg(not(unix))]
struct OsListener;

#[derive(Default)]
struct HubState {
    handlers: HashMap<SignalType, Vec<SignalHandler>>,
    listener: Option<OsListener>,
}

/// Per-process registry of signal handlers.
#[derive(Default)]
pub struct SignalHub {
    state: Mutex<HubState>,
}

impl SignalHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add a handler for `sig`, installing the OS hook if this is the first
    /// handler for that signal.
    pub fn register<F>(self: &Arc<Self>, sig: SignalType, handler: F) -> Result<()>
    where
        F: Fn(SignalType) + Send + Sync + 'static,
    {
        let mut state = self.state.lock();
        self.install(&mut state, sig)?;
        state.handlers.entry(sig).or_default().push(Arc::new(handler));
        tracing::debug!("Registered {} handler", sig);
        Ok(())
    }

    #[cfg(unix)]
    fn install(self: &Arc<Self>, state: &mut HubState, sig: SignalType) -> Result<()> {
        let os_err = |e: std::io::Error| EdgeFlowError::Signal(format!("{}: {}", sig, e));
        match state.listener.as_mut() {
            Some(listener) => listener.install(sig).map_err(os_err),
            None => {
                let listener = OsListener::start(Arc::downgrade(self), sig).map_err(os_err)?;
                state.listener = Some(listener);
                Ok(())
            }
        }
    }

    #[cfg(not(unix))]
    fn install(self: &Arc<Self>, _state: &mut HubState, sig: SignalType) -> Result<()> {
        Err(EdgeFlowError::Signal(format!(
            "{}: signal handling is only supported on unix platforms",
            sig
        )))
    }

    pub fn handler_count(&self, sig: SignalType) -> usize {
        self.state.lock().handlers.get(&sig).map_or(0, Vec::len)
    }

    /// Run every handler registered for `sig`. Returns how many completed
    /// without panicking.
    pub fn dispatch(&self, sig: SignalType) -> usize {
        let handlers = self.state.lock().handlers.get(&sig).cloned().unwrap_or_default();
        tracing::info!("Received {}, running {} handler(s)", sig, handlers.len());

        let mut completed = 0;
        for handler in &handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(sig))) {
                Ok(()) => completed += 1,
                Err(_) => tracing::warn!("{} handler panicked", sig),
            }
        }
        completed
    }

    /// Drop all handlers and stop the OS listener. The next `register`
    /// starts from scratch.
    pub fn reset(&self) {
        let listener = {
            let mut state = self.state.lock();
            state.handlers.clear();
            state.listener.take()
        };
        #[cfg(unix)]
        {
            if let Some(mut listener) = listener {
                listener.handle.close();
                if let Some(thread) = listener.thread.take() {
                    let _ = thread.join();
                }
            }
        }
        #[cfg(not(unix))]
        {
            drop(listener);
        }
    }
}

impl Drop for SignalHub {
    fn drop(&mut self) {
        // May run on the listener thread itself, so close without joining.
        #[cfg(unix)]
        {
            if let Some(listener) = self.state.get_mut().listener.take() {
                listener.handle.close();
            }
        }
    }
}
