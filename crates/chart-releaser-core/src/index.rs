//! Repository index types
//!
//! Helm-compatible `index.yaml` document. Entries are keyed by chart name and
//! each `(name, version)` pair appears at most once.

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

use crate::chart::ChartMetadata;
use crate::error::{CoreError, Result};

/// Repository index (Helm-compatible)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    /// API version
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Charts indexed by name
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<ChartVersion>>,

    /// When this index was generated
    #[serde(default = "Utc::now")]
    pub generated: DateTime<Utc>,

    /// Top-level keys such as `serverInfo` or `annotations`
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_api_version() -> String {
    "v1".to_string()
}

impl Default for IndexFile {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            entries: BTreeMap::new(),
            generated: Utc::now(),
            extra: BTreeMap::new(),
        }
    }
}

impl IndexFile {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse index from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| CoreError::IndexParse {
            message: e.to_string(),
        })
    }

    /// Parse index from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let yaml = std::str::from_utf8(bytes).map_err(|e| CoreError::IndexParse {
            message: format!("Invalid UTF-8: {}", e),
        })?;
        Self::from_yaml(yaml)
    }

    /// Load an index file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read(path)?;
        Self::from_bytes(&content)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the index to disk, overwriting any existing file
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Check whether a chart version is present
    pub fn has(&self, name: &str, version: &str) -> bool {
        self.get(name, version).is_some()
    }

    /// Get a specific chart version
    pub fn get(&self, name: &str, version: &str) -> Option<&ChartVersion> {
        self.entries
            .get(name)?
            .iter()
            .find(|e| e.metadata.version == version)
    }

    /// Add a chart version, replacing an existing entry with the same version
    ///
    /// Returns `true` when an existing entry was replaced.
    pub fn upsert(&mut self, entry: ChartVersion) -> bool {
        let versions = self.entries.entry(entry.metadata.name.clone()).or_default();

        match versions
            .iter_mut()
            .find(|e| e.metadata.version == entry.metadata.version)
        {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => {
                versions.push(entry);
                false
            }
        }
    }

    /// Number of chart versions across all charts
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sort every chart's versions, highest semver first
    pub fn sort_entries(&mut self) {
        for versions in self.entries.values_mut() {
            versions.sort_by(|a, b| compare_versions(&b.metadata.version, &a.metadata.version));
        }
    }
}

fn compare_versions(a: &str, b: &str) -> Ordering {
    match (Version::parse(a).ok(), Version::parse(b).ok()) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// A single chart version in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartVersion {
    /// Metadata copied from the chart's `Chart.yaml`
    #[serde(flatten)]
    pub metadata: ChartMetadata,

    /// URLs to download the chart archive
    #[serde(default)]
    pub urls: Vec<String>,

    /// When this version was added to the index
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,

    /// SHA-256 digest of the archive
    #[serde(default)]
    pub digest: String,
}

impl ChartVersion {
    pub fn new(metadata: ChartMetadata, url: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            metadata,
            urls: vec![url.into()],
            created: Utc::now(),
            digest: digest.into(),
        }
    }

    /// Get the primary download URL
    pub fn download_url(&self) -> Option<&str> {
        self.urls.first().map(|s| s.as_str())
    }
}
