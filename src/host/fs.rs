//! Filesystem stat primitive used by the watcher.
//!
//! Kept behind a trait so the watcher's state machine can be driven by a mock
//! in tests.

use std::io;
use std::path::Path;
use std::time::SystemTime;

/// The subset of file metadata the watcher diffs between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub modified: Option<SystemTime>,
}

/// Stat access to the host filesystem.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystem: Send + Sync {
    /// Stat `path`. A missing path is an `io::ErrorKind::NotFound` error.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let meta = std::fs::metadata(path)?;
        Ok(FileStat {
            size: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}
