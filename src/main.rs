//! edgeflow runtime host - Main Entry Point
//!
//! Loads a runtime config and an `edges.v1` index, instantiates one queue per
//! edge, starts the configured triggers and drains the queues until SIGINT or
//! SIGTERM (or the configured run time elapses).
//!
//! Usage: `edgeflow [CONFIG.toml]`

use anyhow::Context;
use crossbeam_channel::{bounded, select, tick};
use edgeflow::{
    config::RuntimeConfig,
    edge::EdgesIndex,
    queue::BoundedQueue,
    signal::{SignalHub, SignalType},
    wiring::EdgeRuntime,
    Host,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "edgeflow.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,edgeflow=debug")),
        )
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

fn load_edges(config: &RuntimeConfig) -> anyhow::Result<EdgesIndex> {
    let path = match &config.edges_path {
        Some(path) => path.clone(),
        None => {
            let path = EdgesIndex::default_path(".", &config.package);
            if !path.exists() {
                tracing::warn!("No edges index at {:?}, starting with no edges", path);
                return Ok(EdgesIndex::new(config.package.clone()));
            }
            path
        }
    };

    let index = EdgesIndex::load(&path)
        .with_context(|| format!("Failed to load edges index {:?}", path))?;
    tracing::info!(
        "Loaded {} edges for package {} from {:?}",
        index.edges.len(),
        index.package,
        path
    );
    Ok(index)
}

/// Pop everything currently queued. Returns the number of events drained.
fn drain(runtime: &EdgeRuntime) -> usize {
    let mut drained = 0;
    for label in runtime.labels() {
        let Some(queue) = runtime.queue(label) else {
            continue;
        };
        while let Some(event) = queue.pop() {
            tracing::trace!("{} <- {:?} at {}", label, event.value, event.timestamp);
            drained += 1;
        }
    }
    drained
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = RuntimeConfig::load_or_default(config_path.as_deref())?;

    // Hold the guard so buffered file logs flush on exit
    let _log_guard = init_logging(config.log_dir.as_deref());

    tracing::info!("Starting edgeflow runtime");

    let index = load_edges(&config)?;
    let host = Host::new(config.capabilities);
    let mut runtime = EdgeRuntime::from_index(host, config.trigger, &index)?;

    for binding in &config.bindings {
        runtime
            .bind(binding)
            .with_context(|| format!("Failed to bind trigger to {}", binding.edge))?;
    }

    let (stop_tx, stop_rx) = bounded::<SignalType>(1);
    let hub = SignalHub::new();
    for sig in [SignalType::Interrupt, SignalType::Terminate] {
        let tx = stop_tx.clone();
        if let Err(e) = hub.register(sig, move |s| {
            let _ = tx.try_send(s);
        }) {
            tracing::warn!("Signal handling unavailable: {}", e);
            break;
        }
    }

    let deadline = config.run_for().map(|d| Instant::now() + d);
    let ticker = tick(config.drain_interval());
    let mut drained = 0;
    loop {
        select! {
            recv(stop_rx) -> sig => {
                if let Ok(sig) = sig {
                    tracing::info!("{} received, shutting down", sig);
                }
                break;
            }
            recv(ticker) -> _ => {
                drained += drain(&runtime);
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    tracing::info!("Run time elapsed, shutting down");
                    break;
                }
            }
        }
    }

    hub.reset();
    drained += drain(&runtime);

    tracing::info!("Shutting down... ({} events drained)", drained);
    for report in runtime.shutdown() {
        match serde_json::to_string(&report) {
            Ok(json) => tracing::info!("Edge summary: {}", json),
            Err(e) => tracing::warn!("Failed to serialize summary for {}: {}", report.label, e),
        }
    }

    Ok(())
}
