//! Release types and the release store trait

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;

/// A release in the remote release store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Release {
    /// Release name, also used as the tag
    pub name: String,

    /// Release body
    pub description: String,

    /// Commit the tag points at (empty means the default branch head)
    pub commit: String,

    /// Files attached to the release
    pub assets: Vec<Asset>,

    /// Ask the store to append generated release notes
    pub generate_release_notes: bool,

    /// Mark the release as the latest one
    pub make_latest: bool,
}

/// A release asset
///
/// `path` is the local file to upload; `url` is the public download URL,
/// known only once the store has accepted the upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Asset {
    pub path: PathBuf,
    pub url: Option<String>,
}

impl Asset {
    /// An asset that has not been uploaded yet
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            url: None,
        }
    }

    /// File name used for the upload
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Remote store of releases
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Create a release and upload its assets
    ///
    /// Returns the release with every asset's public `url` bound.
    async fn create_release(&self, release: &Release) -> Result<Release>;

    /// Look up a release by tag, failing with `RemoteError::NotFound` when absent
    async fn get_release(&self, tag: &str) -> Result<Release>;

    /// Open a pull request and return its URL
    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        head: &str,
        base: &str,
    ) -> Result<String>;
}
