//! Secret and registry credential models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named bag of secret values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    /// Secret type (e.g. "opaque", "basic")
    #[serde(rename = "type", default)]
    pub secret_type: String,
    /// Key names, always populated
    #[serde(default)]
    pub keys: Vec<String>,
    /// Values; only populated by reveal/create/update
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Vec<u8>>,
}

/// Credentials for an image registry, keyed by server address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub server_address: String,
    #[serde(default)]
    pub namespace: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}
