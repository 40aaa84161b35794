//! Configuration for the ops monitor
//!
//! Hosts usually embed the monitor and hand it a [`OpsConfig`] deserialized
//! from their own config file; `load_config` covers the standalone TOML case.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use sysinfo::System;

use crate::constants::ops::DEFAULT_INTERVAL;

/// Default publication interval in milliseconds
fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL.as_millis() as u64
}

/// Ops monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OpsConfig {
    /// Publication interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Server identity for the snapshot `host` field.
    /// Falls back to the machine hostname when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            host: None,
        }
    }
}

impl OpsConfig {
    /// Publication interval as a `Duration`
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Configured host identity, or the detected hostname
    #[must_use]
    pub fn resolve_host(&self) -> String {
        self.host
            .clone()
            .or_else(System::host_name)
            .unwrap_or_else(|| "localhost".to_string())
    }
}

/// Load configuration from a TOML file
pub fn load_config(config_path: &str) -> Result<OpsConfig> {
    let config_content = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", config_path, e))?;

    let config: OpsConfig = toml::from_str(&config_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", config_path, e))?;

    Ok(config)
}
