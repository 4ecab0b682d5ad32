//! Composition of edges and triggers.
//!
//! [`EdgeRuntime`] instantiates one queue per edge descriptor and lets at
//! most one trigger feed each queue. A pump thread per binding moves events
//! from the trigger's channel into the queue; it exits on its own once the
//! trigger's producers have stopped and the channel disconnects.

use crate::config::{BindingConfig, SourceConfig, TriggerDefaults};
use crate::edge::{EdgeDescriptor, EdgeError, EdgesIndex};
use crate::error::{EdgeFlowError, Result, ResultExt};
use crate::event::Event;
use crate::host::Host;
use crate::queue::{BoundedQueue, EdgeQueue, QueueSnapshot};
use crate::trigger::{
    EventSource, FsEvent, FsWatcher, NetListener, NetMessage, Timer, TriggerHandle,
};
use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Value carried by runtime queues, tagged by the trigger that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Tick(DateTime<Utc>),
    Net(NetMessage),
    Fs(FsEvent),
}

pub type RuntimeQueue = EdgeQueue<Event<Payload>>;

/// Counts kept by a pump.
#[derive(Debug, Default)]
pub struct PumpStats {
    pub forwarded: AtomicU64,
    /// Pushes refused by a full `block` queue.
    pub rejected: AtomicU64,
}

/// Moves events from a trigger channel into a queue.
pub struct Pump {
    label: String,
    stats: Arc<PumpStats>,
    worker: Option<JoinHandle<()>>,
}

impl Pump {
    /// Start pumping `events` into `queue`, converting each value with `map`.
    ///
    /// The thread exits when `events` disconnects.
    pub fn spawn<T, U, Q, F>(
        label: impl Into<String>,
        events: Receiver<Event<T>>,
        queue: Arc<Q>,
        map: F,
    ) -> Result<Self>
    where
        T: Send + 'static,
        U: Send + 'static,
        Q: BoundedQueue<Event<U>> + ?Sized + 'static,
        F: Fn(T) -> U + Send + 'static,
    {
        let label = label.into();
        let stats = Arc::new(PumpStats::default());
        let worker = {
            let label = label.clone();
            let stats = Arc::clone(&stats);
            thread::Builder::new()
                .name(format!("pump-{}", label))
                .spawn(move || {
                    for event in events.iter() {
                        let event = Event::with_timestamp(map(event.value), event.timestamp);
                        match queue.push(event) {
                            Ok(()) => {
                                stats.forwarded.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(e) => {
                                stats.rejected.fetch_add(1, Ordering::Relaxed);
                                tracing::debug!("Edge {} rejected event: {}", label, e);
                            }
                        }
                    }
                    tracing::debug!("Pump for {} exiting", label);
                })?
        };
        Ok(Self {
            label,
            stats,
            worker: Some(worker),
        })
    }

    /// Pump from any event source.
    pub fn attach<T, U, Q, S, F>(
        label: impl Into<String>,
        source: &S,
        queue: Arc<Q>,
        map: F,
    ) -> Result<Self>
    where
        T: Send + 'static,
        U: Send + 'static,
        Q: BoundedQueue<Event<U>> + ?Sized + 'static,
        S: EventSource<T>,
        F: Fn(T) -> U + Send + 'static,
    {
        Self::spawn(label, source.events().clone(), queue, map)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn forwarded(&self) -> u64 {
        self.stats.forwarded.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.stats.rejected.load(Ordering::Relaxed)
    }

    /// Wait for the pump to drain its channel and exit.
    ///
    /// Returns the final `(forwarded, rejected)` totals.
    pub fn join(mut self) -> (u64, u64) {
        self.wait();
        (self.forwarded(), self.rejected())
    }

    fn wait(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Pump for {} panicked", self.label);
            }
        }
    }
}

impl Drop for Pump {
    fn drop(&mut self) {
        self.wait();
    }
}

/// A started trigger, kept alive for the lifetime of its binding.
pub enum ActiveSource {
    Timer(TriggerHandle<DateTime<Utc>>),
    Net(NetListener),
    Watch(TriggerHandle<FsEvent>),
}

impl ActiveSource {
    /// Start the trigger a binding declares.
    pub fn start(host: &Host, source: &SourceConfig, defaults: &TriggerDefaults) -> Result<Self> {
        Ok(match source {
            SourceConfig::Timer { interval_ms } => {
                ActiveSource::Timer(Timer::start(host, Duration::from_millis(*interval_ms))?)
            }
            SourceConfig::Net {
                protocol,
                addr,
                port,
            } => ActiveSource::Net(NetListener::listen_with(
                host,
                *protocol,
                addr,
                *port,
                defaults.net_options(),
            )?),
            SourceConfig::Watch { path, interval_ms } => {
                let interval = interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| defaults.watch_interval());
                ActiveSource::Watch(FsWatcher::watch_with(
                    host,
                    path,
                    interval,
                    defaults.watch_channel_capacity,
                )?)
            }
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ActiveSource::Timer(_) => "timer",
            ActiveSource::Net(_) => "net",
            ActiveSource::Watch(_) => "watch",
        }
    }

    fn pump(&self, label: &str, queue: Arc<RuntimeQueue>) -> Result<Pump> {
        match self {
            ActiveSource::Timer(h) => Pump::attach(label, h, queue, Payload::Tick),
            ActiveSource::Net(l) => Pump::attach(label, l, queue, Payload::Net),
            ActiveSource::Watch(h) => Pump::attach(label, h, queue, Payload::Fs),
        }
    }

    /// Cancel and join the trigger's producer threads.
    pub fn stop(self) {
        match self {
            ActiveSource::Timer(h) => h.stop(),
            ActiveSource::Net(l) => l.close(),
            ActiveSource::Watch(h) => h.stop(),
        }
    }
}

struct Binding {
    source: ActiveSource,
    pump: Pump,
}

/// Final state of one edge after shutdown.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeReport {
    pub label: String,
    #[serde(flatten)]
    pub snapshot: QueueSnapshot,
    pub rejected: u64,
}

/// Queues for a set of edges plus the triggers feeding them.
pub struct EdgeRuntime {
    host: Host,
    defaults: TriggerDefaults,
    queues: BTreeMap<String, Arc<RuntimeQueue>>,
    bindings: BTreeMap<String, Binding>,
}

impl EdgeRuntime {
    pub fn new(host: Host, defaults: TriggerDefaults) -> Self {
        Self {
            host,
            defaults,
            queues: BTreeMap::new(),
            bindings: BTreeMap::new(),
        }
    }

    /// Instantiate a queue for every edge in the index.
    ///
    /// Only a foreign schema tag is fatal. Descriptor diagnostics are logged
    /// and the edge is still built; unknown policies overflow like `dropNewest`.
    pub fn from_index(host: Host, defaults: TriggerDefaults, index: &EdgesIndex) -> Result<Self> {
        index.check_schema()?;
        let mut runtime = Self::new(host, defaults);
        for edge in &index.edges {
            runtime.add_edge(edge)?;
        }
        Ok(runtime)
    }

    pub fn add_edge(&mut self, edge: &EdgeDescriptor) -> Result<Arc<RuntimeQueue>> {
        for diag in edge.diagnostics() {
            tracing::warn!("Edge {}: {} {}", edge.label, diag.code, diag.message);
        }
        if self.queues.contains_key(&edge.label) {
            return Err(EdgeFlowError::Config(format!(
                "duplicate edge label {}",
                edge.label
            )));
        }
        let queue = Arc::new(
            EdgeQueue::from_descriptor(edge).with_context(|| format!("edge {}", edge.label))?,
        );
        tracing::debug!(
            "Edge {} ready ({}, max {}, {})",
            edge.label,
            edge.kind.as_str(),
            edge.max_capacity,
            edge.backpressure
        );
        self.queues.insert(edge.label.clone(), Arc::clone(&queue));
        Ok(queue)
    }

    pub fn queue(&self, label: &str) -> Option<&Arc<RuntimeQueue>> {
        self.queues.get(label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.queues.keys().map(String::as_str)
    }

    pub fn is_bound(&self, label: &str) -> bool {
        self.bindings.contains_key(label)
    }

    /// Start the binding's trigger and pump it into the bound edge.
    pub fn bind(&mut self, binding: &BindingConfig) -> Result<()> {
        let queue = self
            .queues
            .get(&binding.edge)
            .cloned()
            .ok_or_else(|| EdgeError::NotFound(binding.edge.clone()))?;
        if self.bindings.contains_key(&binding.edge) {
            return Err(EdgeFlowError::Config(format!(
                "edge {} already has a trigger",
                binding.edge
            )));
        }

        let source = ActiveSource::start(&self.host, &binding.source, &self.defaults)
            .with_context(|| format!("{} trigger for {}", binding.source.kind(), binding.edge))?;
        let pump = source.pump(&binding.edge, queue)?;
        tracing::info!("Bound {} trigger to {}", source.kind(), binding.edge);
        self.bindings
            .insert(binding.edge.clone(), Binding { source, pump });
        Ok(())
    }

    /// Stop every trigger, wait for pumps to drain, and report each edge.
    pub fn shutdown(mut self) -> Vec<EdgeReport> {
        let mut rejected = BTreeMap::new();
        for (label, binding) in std::mem::take(&mut self.bindings) {
            binding.source.stop();
            // Events still buffered in the channel are pushed during the join.
            let (_, pump_rejected) = binding.pump.join();
            rejected.insert(label, pump_rejected);
        }
        self.queues
            .iter()
            .map(|(label, queue)| EdgeReport {
                label: label.clone(),
                snapshot: queue.snapshot(),
                rejected: rejected.get(label).copied().unwrap_or(0),
            })
            .collect()
    }
}
