//! Wire types for the registry metadata API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Repository catalog response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    pub repositories: Vec<String>,
}

/// Manifest listing for one repository.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPage {
    /// Repository the manifests belong to.
    #[serde(default)]
    pub image_name: Option<String>,

    #[serde(default)]
    pub manifests: Vec<ManifestAttributes>,
}

/// Attributes of a single manifest.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAttributes {
    /// Content-addressed manifest identifier.
    pub digest: String,

    /// Stored size in bytes.
    pub image_size: u64,

    /// When the manifest was pushed.
    pub created_time: DateTime<Utc>,

    #[serde(default)]
    pub last_update_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tags: Vec<String>,
}
