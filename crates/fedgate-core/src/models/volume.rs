//! Volume and container replica models

use serde::{Deserialize, Serialize};

/// A persistent volume
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Requested capacity (e.g. "10G")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
    /// Volume class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// App the volume is bound to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default)]
    pub status: String,
}

/// One running container of an app
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerReplica {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Owning app (backend-local name)
    pub app_name: String,
    #[serde(default)]
    pub container_name: String,
    /// Runtime state (e.g. "running", "waiting")
    #[serde(default)]
    pub state: String,
}

/// Filter for container replica listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerReplicaListOptions {
    /// Restrict to one app; may carry a scope prefix when passed to the gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
}
