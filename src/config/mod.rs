//! Configuration for the edgeflow runtime host.
//!
//! The runtime reads a single TOML file describing which capabilities the
//! host grants, where the compiled `edges.json` lives, and which trigger
//! feeds which edge.
//!
//! # Config Location
//!
//! Unless a path is given on the command line, the file is looked up in the
//! platform config directory:
//! - **Linux**: `~/.config/edgeflow/edgeflow.toml`
//! - **macOS**: `~/Library/Application Support/edgeflow/edgeflow.toml`
//! - **Windows**: `%APPDATA%\edgeflow\edgeflow.toml`
//!
//! # Example
//!
//! ```toml
//! package = "demo"
//! edges_path = "build/debug/asm/demo/edges.json"
//!
//! [capabilities]
//! allow_net = true
//!
//! [[bindings]]
//! edge = "Ingest.step1.in"
//! source = { kind = "net", protocol = "udp", addr = "127.0.0.1", port = 9000 }
//!
//! [[bindings]]
//! edge = "Clock.step1.in"
//! source = { kind = "timer", interval_ms = 250 }
//! ```

use crate::error::{EdgeFlowError, Result};
use crate::host::Capabilities;
use crate::trigger::net::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_READ_BUFFER};
use crate::trigger::watch::DEFAULT_WATCH_CAPACITY;
use crate::trigger::{NetOptions, NetProtocol};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "edgeflow";

/// Config filename
pub const CONFIG_FILE: &str = "edgeflow.toml";

/// Default filesystem poll interval in milliseconds
pub const DEFAULT_WATCH_INTERVAL_MS: u64 = 100;

/// Default interval at which the host drains edge queues
pub const DEFAULT_DRAIN_INTERVAL_MS: u64 = 250;

// ==================== Config Directory ====================

/// Get the platform config directory for edgeflow
pub fn config_dir() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Trigger Defaults ====================

/// Defaults applied to triggers that don't override them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerDefaults {
    /// Buffered events per net listener
    pub net_channel_capacity: usize,
    /// Bytes read per socket read
    pub net_read_buffer: usize,
    /// Buffered events per filesystem watcher
    pub watch_channel_capacity: usize,
    pub watch_interval_ms: u64,
}

impl Default for TriggerDefaults {
    fn default() -> Self {
        Self {
            net_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            net_read_buffer: DEFAULT_READ_BUFFER,
            watch_channel_capacity: DEFAULT_WATCH_CAPACITY,
            watch_interval_ms: DEFAULT_WATCH_INTERVAL_MS,
        }
    }
}

impl TriggerDefaults {
    pub fn net_options(&self) -> NetOptions {
        NetOptions {
            channel_capacity: self.net_channel_capacity,
            read_buffer: self.net_read_buffer,
        }
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }
}

// ==================== Bindings ====================

/// A trigger source declared in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Timer {
        interval_ms: u64,
    },
    Net {
        protocol: NetProtocol,
        #[serde(default = "default_net_addr")]
        addr: String,
        port: u16,
    },
    Watch {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interval_ms: Option<u64>,
    },
}

fn default_net_addr() -> String {
    "127.0.0.1".to_string()
}

impl SourceConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Timer { .. } => "timer",
            SourceConfig::Net { .. } => "net",
            SourceConfig::Watch { .. } => "watch",
        }
    }
}

/// Attaches one trigger to one edge, identified by label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub edge: String,
    pub source: SourceConfig,
}

impl BindingConfig {
    pub fn new(edge: impl Into<String>, source: SourceConfig) -> Self {
        Self {
            edge: edge.into(),
            source,
        }
    }
}

// ==================== Runtime Config ====================

/// Top-level runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Package whose edges are loaded when `edges_path` is unset
    pub package: String,
    /// Explicit path to an `edges.json` index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges_path: Option<PathBuf>,
    /// Directory for daily rolling log files; stderr only when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    /// Stop after this many seconds instead of waiting for a signal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_for_secs: Option<u64>,
    pub drain_interval_ms: u64,
    pub capabilities: Capabilities,
    pub trigger: TriggerDefaults,
    pub bindings: Vec<BindingConfig>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            package: "main".to_string(),
            edges_path: None,
            log_dir: None,
            run_for_secs: None,
            drain_interval_ms: DEFAULT_DRAIN_INTERVAL_MS,
            capabilities: Capabilities::default(),
            trigger: TriggerDefaults::default(),
            bindings: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Load a config file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EdgeFlowError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| EdgeFlowError::Config(format!("Invalid config file {:?}: {}", path, e)))
    }

    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; an explicit path must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| EdgeFlowError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| EdgeFlowError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save the config as TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                EdgeFlowError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, self.to_toml()?).map_err(|e| {
            EdgeFlowError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Reject bindings that could never start.
    pub fn validate(&self) -> Result<()> {
        if self.drain_interval_ms == 0 {
            return Err(EdgeFlowError::Config(
                "drain_interval_ms must be positive".to_string(),
            ));
        }
        for binding in &self.bindings {
            if binding.edge.trim().is_empty() {
                return Err(EdgeFlowError::Config(format!(
                    "{} binding has an empty edge label",
                    binding.source.kind()
                )));
            }
            match &binding.source {
                SourceConfig::Timer { interval_ms: 0 }
                | SourceConfig::Watch {
                    interval_ms: Some(0),
                    ..
                } => {
                    return Err(EdgeFlowError::Config(format!(
                        "{} binding for {} has a zero interval",
                        binding.source.kind(),
                        binding.edge
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for_secs.map(Duration::from_secs)
    }
}
