//! Chart metadata and packaged chart archives
//!
//! A packaged chart is a `.tgz` whose entries all live under a single
//! top-level directory named after the chart, e.g. `nginx/Chart.yaml`.

use flate2::read::GzDecoder;
use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::Archive;

use crate::error::{CoreError, Result};

/// Name of the metadata file at the root of every chart
pub const CHART_FILE: &str = "Chart.yaml";

/// Helm `Chart.yaml` structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// API version (v1 or v2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Chart name
    pub name: String,

    /// Chart version (SemVer)
    pub version: String,

    /// Kubernetes version constraint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_version: Option<String>,

    /// Chart description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Chart type (application or library)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Project home page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ChartDependency>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<Maintainer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Version of the packaged application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Keys this model does not name, kept so a rewrite does not drop them
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ChartMetadata {
    /// Parse metadata from `Chart.yaml` content
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let metadata: Self = serde_yaml::from_str(yaml)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Check the fields the index relies on
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidMetadata {
                message: "chart name must not be empty".to_string(),
            });
        }
        Version::parse(&self.version).map_err(|e| CoreError::InvalidMetadata {
            message: format!("chart version '{}' is not valid SemVer: {}", self.version, e),
        })?;
        Ok(())
    }

    /// Chart version as semver
    pub fn parsed_version(&self) -> Option<Version> {
        Version::parse(&self.version).ok()
    }
}

/// Chart dependency as declared in `Chart.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDependency {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// `import-values`, `enabled` and any other dependency keys
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Chart maintainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintainer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A chart archive loaded from disk
#[derive(Debug, Clone)]
pub struct LoadedChart {
    /// Path of the `.tgz` file
    pub path: PathBuf,

    /// Top-level directory inside the archive
    pub root: String,

    /// Parsed `Chart.yaml`
    pub metadata: ChartMetadata,
}

impl LoadedChart {
    /// Open a packaged chart and parse its `Chart.yaml`
    ///
    /// Fails with [`CoreError::ChartNotFound`] when the file does not exist
    /// and [`CoreError::InvalidChart`] when it is not a chart archive.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CoreError::ChartNotFound {
                path: path.display().to_string(),
            });
        }

        let invalid = |message: String| CoreError::InvalidChart {
            path: path.display().to_string(),
            message,
        };

        let mut archive = Archive::new(GzDecoder::new(File::open(path)?));
        let entries = archive.entries().map_err(|e| invalid(e.to_string()))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| invalid(e.to_string()))?;
            let entry_path = entry.path().map_err(|e| invalid(e.to_string()))?.into_owned();

            let Some(root) = chart_root(&entry_path) else {
                continue;
            };

            let mut content = String::new();
            entry
                .read_to_string(&mut content)
                .map_err(|e| invalid(format!("unreadable {}: {}", CHART_FILE, e)))?;

            let metadata = ChartMetadata::from_yaml(&content).map_err(|e| invalid(e.to_string()))?;

            tracing::debug!(
                "Loaded chart {} {} from {}",
                metadata.name,
                metadata.version,
                path.display()
            );

            return Ok(Self {
                path: path.to_path_buf(),
                root,
                metadata,
            });
        }

        Err(invalid(format!("no {} found", CHART_FILE)))
    }

    /// Read a file stored under the chart's root directory
    pub fn read_file(&self, relative: &str) -> Result<Vec<u8>> {
        let wanted = Path::new(&self.root).join(relative);
        let mut archive = Archive::new(GzDecoder::new(File::open(&self.path)?));

        for entry in archive.entries()? {
            let mut entry = entry?;
            if *entry.path()? == *wanted {
                let mut content = Vec::new();
                entry.read_to_end(&mut content)?;
                return Ok(content);
            }
        }

        Err(CoreError::FileNotInArchive {
            path: self.path.display().to_string(),
            file: relative.to_string(),
        })
    }

    /// SHA-256 digest of the archive file
    pub fn digest(&self) -> Result<String> {
        digest_file(&self.path)
    }
}

/// Return the top-level directory when `path` is `<root>/Chart.yaml`
fn chart_root(path: &Path) -> Option<String> {
    let components: Vec<_> = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    match components.as_slice() {
        [Component::Normal(root), Component::Normal(file)] if *file == CHART_FILE => {
            Some(root.to_string_lossy().to_string())
        }
        _ => None,
    }
}

/// Compute the hex-encoded SHA-256 digest of a file
pub fn digest_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::create_archive;
    use tempfile::TempDir;

    fn write_chart(dir: &Path, name: &str, version: &str) -> PathBuf {
        let chart_dir = dir.join(name);
        std::fs::create_dir_all(chart_dir.join("templates")).unwrap();
        std::fs::write(
            chart_dir.join(CHART_FILE),
            format!(
                "apiVersion: v2\nname: {}\nversion: {}\ndescription: A Helm chart for Kubernetes\n",
                name, version
            ),
        )
        .unwrap();
        std::fs::write(chart_dir.join("README.md"), "# Release notes\n").unwrap();
        std::fs::write(chart_dir.join("templates/cm.yaml"), "kind: ConfigMap\n").unwrap();
        chart_dir
    }

    #[test]
    fn test_parse_metadata() {
        let metadata = ChartMetadata::from_yaml(
            r#"
apiVersion: v2
name: nginx
version: 15.0.0
appVersion: "1.25.0"
description: NGINX Open Source
keywords:
  - webserver
maintainers:
  - name: Jane
    email: jane@example.com
"#,
        )
        .unwrap();

        assert_eq!(metadata.name, "nginx");
        assert_eq!(metadata.app_version.as_deref(), Some("1.25.0"));
        assert_eq!(metadata.maintainers.len(), 1);
        assert_eq!(metadata.parsed_version().unwrap().major, 15);
    }

    #[test]
    fn test_metadata_rejects_bad_version() {
        let err = ChartMetadata::from_yaml("name: nginx\nversion: latest\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidMetadata { .. }));
    }

    #[test]
    fn test_load_chart_archive() {
        let temp = TempDir::new().unwrap();
        let chart_dir = write_chart(temp.path(), "test-chart", "0.1.0");
        let archive = create_archive(&chart_dir, temp.path()).unwrap();

        let chart = LoadedChart::load(&archive).unwrap();
        assert_eq!(chart.root, "test-chart");
        assert_eq!(chart.metadata.name, "test-chart");
        assert_eq!(chart.metadata.version, "0.1.0");
        assert_eq!(
            chart.metadata.description.as_deref(),
            Some("A Helm chart for Kubernetes")
        );
    }

    #[test]
    fn test_load_missing_archive() {
        let err = LoadedChart::load(Path::new("does-not-exist-0.1.0.tgz")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_garbage_archive() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken-0.1.0.tgz");
        std::fs::write(&path, b"definitely not gzip").unwrap();

        let err = LoadedChart::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::InvalidChart { .. }));
    }

    #[test]
    fn test_read_file_from_archive() {
        let temp = TempDir::new().unwrap();
        let chart_dir = write_chart(temp.path(), "test-chart", "0.1.0");
        let archive = create_archive(&chart_dir, temp.path()).unwrap();
        let chart = LoadedChart::load(&archive).unwrap();

        assert_eq!(chart.read_file("README.md").unwrap(), b"# Release notes\n");
        assert!(matches!(
            chart.read_file("NOTES.txt"),
            Err(CoreError::FileNotInArchive { .. })
        ));
    }

    #[test]
    fn test_digest_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data");
        std::fs::write(&path, b"hello world").unwrap();

        assert_eq!(
            digest_file(&path).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_chart_root() {
        assert_eq!(chart_root(Path::new("nginx/Chart.yaml")).as_deref(), Some("nginx"));
        assert_eq!(chart_root(Path::new("./nginx/Chart.yaml")).as_deref(), Some("nginx"));
        assert!(chart_root(Path::new("nginx/charts/redis/Chart.yaml")).is_none());
        assert!(chart_root(Path::new("Chart.yaml")).is_none());
    }
}
