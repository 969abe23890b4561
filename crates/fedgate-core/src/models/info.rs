//! Per-backend informational summary

use serde::{Deserialize, Serialize};

/// Summary of one backend. Not addressable, so never scope-prefixed;
/// the gateway stamps `name` and `namespace` from the backend instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// Scope identifier of the reporting backend
    #[serde(default)]
    pub name: String,
    /// Namespace of the reporting backend
    #[serde(default)]
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}
