//! Application models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A deployed application
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct App {
    /// Application name (scope-prefixed once returned by the gateway)
    pub name: String,
    /// Namespace inside the owning backend
    #[serde(default)]
    pub namespace: String,
    /// Image the app was run from
    #[serde(default)]
    pub image: String,
    /// Whether the app has been stopped
    #[serde(default)]
    pub stopped: bool,
    /// Whether an upgrade is waiting for confirmation
    #[serde(default)]
    pub upgrade_pending: bool,
    /// User labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
}

/// Options for running a new app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppRunOptions {
    /// Requested name; may carry a scope prefix when passed to the gateway
    #[serde(default)]
    pub name: String,
    /// Labels to attach
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// Options for updating an existing app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppUpdateOptions {
    /// New image, if changing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Labels to merge into the existing set
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// One line of application output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    /// App that produced the line
    pub app_name: String,
    /// Container within the app
    #[serde(default)]
    pub container_name: String,
    /// Log line
    pub line: String,
    /// When the line was written
    pub time: DateTime<Utc>,
}

/// Options for app log retrieval
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogOptions {
    /// Only the last N lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tail: Option<usize>,
    /// Keep streaming new lines
    #[serde(default)]
    pub follow: bool,
}
