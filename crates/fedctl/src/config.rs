//! Configuration file handling for fedctl

use std::path::Path;

use anyhow::{Context, Result};
use fedgate::GatewayConfig;
use fedgate_memory::RegistryConfig;
use serde::Deserialize;

/// The `[gateway]` table; every other key belongs to the registry
#[derive(Debug, Default, Deserialize)]
struct GatewaySection {
    #[serde(default)]
    gateway: GatewayConfig,
}

/// Everything fedctl reads from its config file
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub registry: RegistryConfig,
}

impl Config {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let section: GatewaySection = toml::from_str(content)?;
        let registry = RegistryConfig::from_toml_str(content)?;
        Ok(Self {
            gateway: section.gateway,
            registry,
        })
    }
}
