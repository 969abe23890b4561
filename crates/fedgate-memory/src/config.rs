//! Registry configuration
//!
//! ```toml
//! default_scope = "home"
//!
//! [[scope]]
//! id = "home"
//! namespace = "acorn"
//!
//! [[scope.apps]]
//! name = "web"
//! image = "nginx"
//!
//! [[scope]]
//! id = "acme/eu"
//! region = "eu-west"
//! ```
//!
//! Scopes are registered in file order; that is the order list calls
//! return results in.

use std::collections::HashSet;
use std::path::Path;

use fedgate_core::{
    App, ComputeClass, ContainerReplica, Credential, Event, Image, Project, Region, Secret, Volume,
    VolumeClass,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Scope of the default backend; the first scope when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scope: Option<String>,
    /// Backends, in registry order
    #[serde(default, rename = "scope")]
    pub scopes: Vec<ScopeConfig>,
}

/// One backend and the resources it starts with
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Scope identifier; may contain `/`
    pub id: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub apps: Vec<App>,
    #[serde(default)]
    pub secrets: Vec<Secret>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
    #[serde(default)]
    pub volumes: Vec<Volume>,
    #[serde(default)]
    pub replicas: Vec<ContainerReplica>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub regions: Vec<Region>,
    #[serde(default)]
    pub compute_classes: Vec<ComputeClass>,
    #[serde(default)]
    pub volume_classes: Vec<VolumeClass>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl RegistryConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Scope the registry falls back to for unscoped names
    pub fn resolved_default_scope(&self) -> Option<&str> {
        self.default_scope
            .as_deref()
            .or_else(|| self.scopes.first().map(|s| s.id.as_str()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scopes.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[scope]] is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for scope in &self.scopes {
            if scope.id.is_empty() {
                return Err(ConfigError::Invalid("scope id must not be empty".to_string()));
            }
            if !seen.insert(scope.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate scope id '{}'",
                    scope.id
                )));
            }
        }

        if let Some(default) = &self.default_scope {
            if !seen.contains(default.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "default_scope '{}' does not name a configured scope",
                    default
                )));
            }
        }

        Ok(())
    }
}
