//! Image models

use serde::{Deserialize, Serialize};

/// A stored image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Image ID (digest-derived)
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub digest: String,
}

/// Options for deleting an image
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageDeleteOptions {
    /// Delete even if an app still runs the image
    #[serde(default)]
    pub force: bool,
}
