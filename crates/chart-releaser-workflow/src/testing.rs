//! In-memory collaborators for workflow tests
//!
//! The fakes record every call so tests can assert on what the workflow
//! asked for, and keep state behind `Arc` so a clone handed to the
//! [`Releaser`](crate::Releaser) shares it with the test.

use async_trait::async_trait;
use chart_releaser_remote::{GitWorker, IndexFetcher, Release, ReleaseStore, RemoteError, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Build `<dir>/<name>-<version>.tgz` from a minimal chart
pub fn write_chart_package(dir: &Path, name: &str, version: &str) -> PathBuf {
    write_chart_package_with_files(dir, name, version, &[])
}

/// Build a chart package with extra files next to `Chart.yaml`
pub fn write_chart_package_with_files(
    dir: &Path,
    name: &str,
    version: &str,
    files: &[(&str, &str)],
) -> PathBuf {
    let source = tempfile::TempDir::new().unwrap();
    let chart_dir = source.path().join(name);
    std::fs::create_dir_all(chart_dir.join("templates")).unwrap();
    std::fs::write(
        chart_dir.join("Chart.yaml"),
        format!(
            "apiVersion: v2\nname: {}\nversion: {}\ndescription: A Helm chart for Kubernetes\n",
            name, version
        ),
    )
    .unwrap();
    std::fs::write(chart_dir.join("values.yaml"), "replicaCount: 1\n").unwrap();
    for (path, content) in files {
        let target = chart_dir.join(path);
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(target, content).unwrap();
    }

    chart_releaser_core::create_archive(&chart_dir, dir).unwrap()
}

/// Counts of release store calls
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StoreCounts {
    pub gets: usize,
    pub creates: usize,
    pub pull_requests: usize,
}

/// A recorded pull request
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestCall {
    pub owner: String,
    pub repo: String,
    pub message: String,
    pub head: String,
    pub base: String,
}

/// In-memory release store
#[derive(Clone, Default)]
pub struct FakeReleaseStore {
    releases: Arc<RwLock<HashMap<String, Release>>>,
    created: Arc<RwLock<Vec<Release>>>,
    pull_requests: Arc<RwLock<Vec<PullRequestCall>>>,
    failing_tags: Arc<RwLock<HashSet<String>>>,
    counts: Arc<RwLock<StoreCounts>>,
}

impl FakeReleaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an existing release
    pub fn with_release(self, release: Release) -> Self {
        self.releases
            .write()
            .unwrap()
            .insert(release.name.clone(), release);
        self
    }

    /// Make `get_release(tag)` fail with a network error
    pub fn failing_get(self, tag: &str) -> Self {
        self.failing_tags.write().unwrap().insert(tag.to_string());
        self
    }

    /// Releases passed to `create_release`, as received
    pub fn created(&self) -> Vec<Release> {
        self.created.read().unwrap().clone()
    }

    pub fn pull_requests(&self) -> Vec<PullRequestCall> {
        self.pull_requests.read().unwrap().clone()
    }

    pub fn counts(&self) -> StoreCounts {
        self.counts.read().unwrap().clone()
    }
}

/// Public download URL the fake binds for an uploaded asset
pub fn download_url(release: &str, file: &str) -> String {
    format!(
        "https://github.com/owner/repo/releases/download/{}/{}",
        release, file
    )
}

#[async_trait]
impl ReleaseStore for FakeReleaseStore {
    async fn create_release(&self, release: &Release) -> Result<Release> {
        self.counts.write().unwrap().creates += 1;
        self.created.write().unwrap().push(release.clone());

        let mut published = release.clone();
        for asset in &mut published.assets {
            asset.url = Some(download_url(&release.name, &asset.file_name()));
        }
        self.releases
            .write()
            .unwrap()
            .insert(published.name.clone(), published.clone());

        Ok(published)
    }

    async fn get_release(&self, tag: &str) -> Result<Release> {
        self.counts.write().unwrap().gets += 1;

        if self.failing_tags.read().unwrap().contains(tag) {
            return Err(RemoteError::Network {
                message: "connection reset by peer".to_string(),
            });
        }

        self.releases
            .read()
            .unwrap()
            .get(tag)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                what: format!("release {}", tag),
            })
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        head: &str,
        base: &str,
    ) -> Result<String> {
        self.counts.write().unwrap().pull_requests += 1;
        self.pull_requests.write().unwrap().push(PullRequestCall {
            owner: owner.to_string(),
            repo: repo.to_string(),
            message: message.to_string(),
            head: head.to_string(),
            base: base.to_string(),
        });
        Ok(format!("https://github.com/{}/{}/pull/1", owner, repo))
    }
}

/// In-memory git worker
///
/// Worktrees are real directories under `root` so the workflow can copy
/// files into them; staged files are snapshotted at `add` time.
#[derive(Clone)]
pub struct FakeGit {
    root: PathBuf,
    fail_push: bool,
    worktrees: Arc<RwLock<Vec<PathBuf>>>,
    removed: Arc<RwLock<Vec<PathBuf>>>,
    staged: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
    commits: Arc<RwLock<Vec<String>>>,
    pushes: Arc<RwLock<Vec<Vec<String>>>>,
}

impl FakeGit {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            fail_push: false,
            worktrees: Arc::default(),
            removed: Arc::default(),
            staged: Arc::default(),
            commits: Arc::default(),
            pushes: Arc::default(),
        }
    }

    /// Make every push fail
    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn worktrees(&self) -> Vec<PathBuf> {
        self.worktrees.read().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.read().unwrap().clone()
    }

    /// Content of a staged file, by path relative to the worktree
    pub fn staged(&self, path: &str) -> Option<Vec<u8>> {
        self.staged.read().unwrap().get(Path::new(path)).cloned()
    }

    pub fn commits(&self) -> Vec<String> {
        self.commits.read().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<Vec<String>> {
        self.pushes.read().unwrap().clone()
    }
}

#[async_trait]
impl GitWorker for FakeGit {
    async fn add_worktree(&self, _dir: &Path, _committish: &str) -> Result<PathBuf> {
        let mut worktrees = self.worktrees.write().unwrap();
        let path = self
            .root
            .join(format!("chart-releaser-{:09}", worktrees.len()));
        std::fs::create_dir_all(&path)?;
        worktrees.push(path.clone());
        Ok(path)
    }

    async fn remove_worktree(&self, _dir: &Path, path: &Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_dir_all(path)?;
        }
        self.removed.write().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn add(&self, dir: &Path, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Err(RemoteError::GitCommand {
                command: "add".to_string(),
                stderr: "no paths specified".to_string(),
            });
        }
        let mut staged = self.staged.write().unwrap();
        for path in paths {
            staged.insert(path.clone(), std::fs::read(dir.join(path))?);
        }
        Ok(())
    }

    async fn commit(&self, _dir: &Path, message: &str) -> Result<()> {
        self.commits.write().unwrap().push(message.to_string());
        Ok(())
    }

    async fn push(&self, _dir: &Path, args: &[String]) -> Result<()> {
        if self.fail_push {
            return Err(RemoteError::GitCommand {
                command: "push".to_string(),
                stderr: "! [rejected] (fetch first)".to_string(),
            });
        }
        self.pushes.write().unwrap().push(args.to_vec());
        Ok(())
    }

    async fn push_url(&self, _remote: &str, token: &str) -> Result<String> {
        Ok(format!(
            "https://x-access-token:{}@github.com/owner/repo",
            token
        ))
    }
}

/// Index fetcher serving a fixed response
#[derive(Clone, Default)]
pub struct FakeFetcher {
    body: Option<Vec<u8>>,
    fail: bool,
    requests: Arc<RwLock<Vec<String>>>,
}

impl FakeFetcher {
    /// Every URL answers with a non-200 status
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn serving(body: &str) -> Self {
        Self {
            body: Some(body.as_bytes().to_vec()),
            ..Self::default()
        }
    }

    /// Every request fails at the transport level
    pub fn unreachable() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl IndexFetcher for FakeFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.write().unwrap().push(url.to_string());
        if self.fail {
            return Err(RemoteError::Network {
                message: "connection refused".to_string(),
            });
        }
        self.body.clone().ok_or_else(|| RemoteError::NotFound {
            what: url.to_string(),
        })
    }
}
