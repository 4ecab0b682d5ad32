//! Host I/O boundary.
//!
//! Trigger sources never touch the filesystem or network directly: they are
//! handed a [`Host`], which checks the capability policy and forwards to the
//! underlying primitives. A denied capability is returned to the caller as-is;
//! nothing here retries or falls back.

pub mod capabilities;
pub mod fs;

pub use capabilities::{Capabilities, Capability, CapabilityDenied};
pub use fs::{FileStat, FileSystem, OsFileSystem};

use std::sync::Arc;

/// Capability-gated access to host primitives.
#[derive(Clone)]
pub struct Host {
    capabilities: Capabilities,
    fs: Arc<dyn FileSystem>,
}

impl Default for Host {
    fn default() -> Self {
        Self::new(Capabilities::default())
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl Host {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            fs: Arc::new(OsFileSystem),
        }
    }

    /// Replace the filesystem backend.
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn check(&self, capability: Capability) -> Result<(), CapabilityDenied> {
        self.capabilities.check(capability)
    }

    /// The filesystem backend, after checking the `fs` capability.
    pub fn fs(&self) -> Result<Arc<dyn FileSystem>, CapabilityDenied> {
        self.check(Capability::Fs)?;
        Ok(Arc::clone(&self.fs))
    }
}
