//! gridsource.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::series::Aggregation;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Answer cross-origin requests from browser-side dashboards.
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3003,
            cors: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: Option<String>,
    pub json: bool,
}

/// Built-in synthetic sources, for trying the datasource without a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub enabled: bool,
    /// Identifiers served by the `$default` demo source.
    pub metrics: Vec<String>,
    /// Spacing of generated points, in seconds.
    pub step_secs: u64,
    pub aggregation: Aggregation,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            metrics: vec![
                "/dc1/rackA/temp".to_string(),
                "/dc1/rackA/humidity".to_string(),
                "/dc1/rackB/temp".to_string(),
                "/dc2/row1/rackC/power".to_string(),
            ],
            step_secs: 60,
            aggregation: Aggregation::Mean,
        }
    }
}

impl ServiceConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
