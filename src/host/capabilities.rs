//! Capability policy consulted before touching the filesystem, network or devices.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A gated class of host access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Fs,
    Net,
    Device,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Fs => "fs",
            Capability::Net => "net",
            Capability::Device => "device",
        })
    }
}

/// Returned when an operation is blocked by the capability policy.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("capability denied: {0}")]
pub struct CapabilityDenied(pub Capability);

/// Allow-flags for host access. Defaults allow everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub allow_fs: bool,
    pub allow_net: bool,
    pub allow_device: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::allow_all()
    }
}

impl Capabilities {
    pub const fn allow_all() -> Self {
        Self {
            allow_fs: true,
            allow_net: true,
            allow_device: true,
        }
    }

    pub const fn deny_all() -> Self {
        Self {
            allow_fs: false,
            allow_net: false,
            allow_device: false,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Fs => self.allow_fs,
            Capability::Net => self.allow_net,
            Capability::Device => self.allow_device,
        }
    }

    pub fn check(&self, capability: Capability) -> Result<(), CapabilityDenied> {
        if self.allows(capability) {
            Ok(())
        } else {
            Err(CapabilityDenied(capability))
        }
    }
}
