//! Poll-based single-path filesystem watcher.

use super::{emit, CancelToken, TriggerError, TriggerHandle, TriggerResult};
use crate::event::Event;
use crate::host::{FileStat, FileSystem, Host};
use crossbeam_channel::bounded;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_WATCH_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FsEventKind {
    Create,
    Modify,
    Remove,
}

/// A change observed on the watched path. `Remove` carries no metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
}

/// What the previous poll saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct WatchState {
    last: Option<FileStat>,
}

impl WatchState {
    pub(crate) fn existed(&self) -> bool {
        self.last.is_some()
    }

    /// Fold one stat result into the state, returning the change it implies.
    ///
    /// Errors other than not-found leave the state untouched.
    pub(crate) fn observe(&mut self, path: &Path, stat: io::Result<FileStat>) -> Option<FsEvent> {
        match (self.last, stat) {
            (None, Ok(now)) => {
                self.last = Some(now);
                Some(event(FsEventKind::Create, path, Some(now)))
            }
            (Some(prev), Ok(now)) => {
                self.last = Some(now);
                (prev != now).then(|| event(FsEventKind::Modify, path, Some(now)))
            }
            (Some(_), Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                self.last = None;
                Some(event(FsEventKind::Remove, path, None))
            }
            (_, Err(e)) => {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!("Stat of {} failed: {}", path.display(), e);
                }
                None
            }
        }
    }
}

fn event(kind: FsEventKind, path: &Path, stat: Option<FileStat>) -> FsEvent {
    FsEvent {
        kind,
        path: path.to_path_buf(),
        size: stat.map(|s| s.size),
        modified: stat.and_then(|s| s.modified),
    }
}

/// Watches one path by polling its metadata.
pub struct FsWatcher;

impl FsWatcher {
    pub fn watch(
        host: &Host,
        path: impl Into<PathBuf>,
        interval: Duration,
    ) -> TriggerResult<TriggerHandle<FsEvent>> {
        Self::watch_with(host, path, interval, DEFAULT_WATCH_CAPACITY)
    }

    /// Start polling `path` every `interval`.
    ///
    /// The path's current state is the baseline: a file that already exists
    /// does not produce `Create`.
    pub fn watch_with(
        host: &Host,
        path: impl Into<PathBuf>,
        interval: Duration,
        capacity: usize,
    ) -> TriggerResult<TriggerHandle<FsEvent>> {
        if interval.is_zero() {
            return Err(TriggerError::InvalidInterval(interval));
        }
        let fs: Arc<dyn FileSystem> = host.fs()?;
        let path = path.into();

        let mut state = WatchState::default();
        let _ = state.observe(&path, fs.stat(&path));

        let (tx, rx) = bounded(capacity);
        let token = CancelToken::new();
        let name = format!("watch-{}", path.display());

        let worker = {
            let token = token.clone();
            let path = path.clone();
            thread::Builder::new().name(name.clone()).spawn(move || {
                while !token.wait_timeout(interval) {
                    let Some(change) = state.observe(&path, fs.stat(&path)) else {
                        continue;
                    };
                    tracing::debug!("{:?} {}", change.kind, path.display());
                    if !emit(&tx, &token, Event::new(change)) {
                        break;
                    }
                }
                tracing::debug!("Watcher for {} exiting", path.display());
            })?
        };

        tracing::info!(
            "Watching {} every {:?} (exists: {})",
            path.display(),
            interval,
            state.existed()
        );
        Ok(TriggerHandle::new(name, rx, token, worker))
    }
}
