//! Release options
//!
//! Options are read from a YAML file (`cr.yaml`) and then overridden by
//! command-line flags. Lookup order for the file:
//!
//! 1. an explicit `--config` path
//! 2. `./cr.yaml`
//! 3. `~/.config/cr/cr.yaml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};

/// Default release name template
pub const DEFAULT_RELEASE_NAME_TEMPLATE: &str = "{{ .Name }}-{{ .Version }}";

const CONFIG_FILE: &str = "cr.yaml";

/// Everything one invocation needs, immutable once the workflow starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// GitHub user or organization owning the repository
    pub owner: String,

    /// GitHub repository receiving the releases
    pub git_repo: String,

    /// Base URL of the published chart repository (defaults to GitHub Pages)
    pub charts_repo: Option<String>,

    /// GitHub API token
    #[serde(skip_serializing)]
    pub token: String,

    /// GitHub REST API base URL
    pub git_base_url: String,

    /// GitHub asset upload base URL
    pub git_upload_url: String,

    /// Directory holding the packaged `.tgz` charts
    pub package_path: PathBuf,

    /// Local path of the index file
    pub index_path: PathBuf,

    /// Branch serving the chart repository
    pub pages_branch: String,

    /// Path of the index file inside the pages branch
    pub pages_index_path: PathBuf,

    /// Git remote to push to
    pub remote: String,

    /// Commit the release tags point at (empty = default branch head)
    pub commit: String,

    /// Push index and packages directly to the pages branch
    pub push: bool,

    /// Open a pull request against the pages branch instead of pushing
    pub pr: bool,

    /// Serve packages from the pages branch next to the index
    pub packages_with_index: bool,

    /// Skip packages already present in the local index
    pub skip_existing: bool,

    /// Template for release names
    pub release_name_template: String,

    /// File inside the chart archive used as the release body
    pub release_notes_file: Option<String>,

    /// Let GitHub append generated release notes
    pub generate_release_notes: bool,

    /// Mark created releases as latest
    pub make_release_latest: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            owner: String::new(),
            git_repo: String::new(),
            charts_repo: None,
            token: String::new(),
            git_base_url: "https://api.github.com/".to_string(),
            git_upload_url: "https://uploads.github.com/".to_string(),
            package_path: PathBuf::from(".cr-release-packages"),
            index_path: PathBuf::from(".cr-index/index.yaml"),
            pages_branch: "gh-pages".to_string(),
            pages_index_path: PathBuf::from("index.yaml"),
            remote: "origin".to_string(),
            commit: String::new(),
            push: false,
            pr: false,
            packages_with_index: false,
            skip_existing: false,
            release_name_template: DEFAULT_RELEASE_NAME_TEMPLATE.to_string(),
            release_notes_file: None,
            generate_release_notes: false,
            make_release_latest: true,
        }
    }
}

impl Options {
    /// Load options from the first config file found, or defaults
    ///
    /// An explicit path must exist; the implicit locations are optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() {
            return Self::load_from(&local);
        }

        if let Some(path) = Self::user_config_path() {
            if path.is_file() {
                return Self::load_from(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load options from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ReleaseError::InvalidConfig {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        tracing::debug!("Loaded options from {}", path.display());
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Per-user config file location
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cr").join(CONFIG_FILE))
    }

    /// URL of the published index, used when no local index exists
    pub fn remote_index_url(&self) -> String {
        match &self.charts_repo {
            Some(repo) => format!("{}/index.yaml", repo.trim_end_matches('/')),
            None => format!(
                "https://{}.github.io/{}/index.yaml",
                self.owner, self.git_repo
            ),
        }
    }

    /// Whether changes are published to the pages branch
    pub fn publishes_to_branch(&self) -> bool {
        self.push || self.pr
    }

    /// Check the fields needed to create releases
    pub fn validate_for_upload(&self) -> Result<()> {
        self.require("owner", &self.owner)?;
        self.require("git-repo", &self.git_repo)?;
        self.require("token", &self.token)?;
        self.validate_publishing()
    }

    /// Check the fields needed to update the index
    pub fn validate_for_index(&self) -> Result<()> {
        self.require("owner", &self.owner)?;
        self.require("git-repo", &self.git_repo)?;
        if self.publishes_to_branch() {
            self.require("token", &self.token)?;
        }
        self.validate_publishing()
    }

    fn validate_publishing(&self) -> Result<()> {
        if self.push && self.pr {
            return Err(ReleaseError::InvalidConfig {
                message: "--push and --pr are mutually exclusive".to_string(),
            });
        }
        if self.publishes_to_branch() {
            self.require("pages-branch", &self.pages_branch)?;
            self.require("remote", &self.remote)?;
        }
        Ok(())
    }

    fn require(&self, name: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ReleaseError::InvalidConfig {
                message: format!("'{}' is required", name),
            });
        }
        Ok(())
    }
}
