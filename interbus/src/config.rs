//! Configuration loading.
//!
//! Configuration comes from a TOML file. Every field has a default, so an
//! empty file (or no file) gives the stock discovery policy. Environment
//! variables override individual settings after the file is read.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::{
    error::{Error, Result},
    probe::DiscoveryConfig,
    transport::Port,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub discovery: DiscoverySection,
    pub simulation: SimulationSection,
}

/// `[discovery]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Extra attempts when a probe answers busy
    pub busy_retries: u32,

    /// Delay between busy retries, milliseconds
    pub busy_backoff_ms: u64,

    pub auto_mode: bool,
    pub live_mode: bool,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        let defaults = DiscoveryConfig::default();
        Self {
            busy_retries: defaults.busy_retries,
            busy_backoff_ms: defaults.busy_backoff.as_millis() as u64,
            auto_mode: defaults.auto_mode,
            live_mode: defaults.live_mode,
        }
    }
}

/// `[simulation]`, read by the dry-run scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationSection {
    pub modules: Vec<SimulatedModule>,
}

/// One `[[simulation.modules]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimulatedModule {
    pub port: Port,
    pub address: u8,
    pub device_type: u8,
}

impl Config {
    /// Parse configuration from a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Discovery policy from the file, with environment overrides applied.
    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            busy_retries: self.discovery.busy_retries,
            busy_backoff: Duration::from_millis(self.discovery.busy_backoff_ms),
            auto_mode: self.discovery.auto_mode,
            live_mode: self.discovery.live_mode,
        }
        .with_env_overrides()
    }
}
