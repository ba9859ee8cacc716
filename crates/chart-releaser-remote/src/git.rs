//! Git worker backed by the system `git` binary

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use url::Url;

use crate::error::{RemoteError, Result};

/// Version control operations needed to publish into a branch
#[async_trait]
pub trait GitWorker: Send + Sync {
    /// Check out `committish` into a fresh temporary worktree and return its path
    async fn add_worktree(&self, dir: &Path, committish: &str) -> Result<PathBuf>;

    /// Remove a worktree created by [`GitWorker::add_worktree`]
    async fn remove_worktree(&self, dir: &Path, path: &Path) -> Result<()>;

    /// Stage paths
    async fn add(&self, dir: &Path, paths: &[PathBuf]) -> Result<()>;

    /// Commit staged changes
    async fn commit(&self, dir: &Path, message: &str) -> Result<()>;

    /// Push with raw `git push` arguments
    async fn push(&self, dir: &Path, args: &[String]) -> Result<()>;

    /// Push URL of `remote` with `token` embedded as credentials
    async fn push_url(&self, remote: &str, token: &str) -> Result<String>;
}

/// [`GitWorker`] that shells out to `git`
#[derive(Debug, Clone, Default)]
pub struct Git;

impl Git {
    pub fn new() -> Self {
        Self
    }

    /// Run a git command in `dir` and return its trimmed stdout
    async fn run(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new("git");
        if !dir.as_os_str().is_empty() {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(args);

        tracing::debug!("Running git {}", redact(&args.join(" ")));

        let output = cmd.output().await?;
        if !output.status.success() {
            return Err(RemoteError::GitCommand {
                command: redact(&args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl GitWorker for Git {
    async fn add_worktree(&self, dir: &Path, committish: &str) -> Result<PathBuf> {
        let worktree = tempfile::Builder::new()
            .prefix("chart-releaser-")
            .tempdir()?
            .keep();
        let worktree_arg = worktree.to_string_lossy().to_string();

        if let Err(e) = self
            .run(dir, &["worktree", "add", "--detach", &worktree_arg, committish])
            .await
        {
            let _ = tokio::fs::remove_dir_all(&worktree).await;
            return Err(e);
        }

        Ok(worktree)
    }

    async fn remove_worktree(&self, dir: &Path, path: &Path) -> Result<()> {
        let path_arg = path.to_string_lossy().to_string();
        let result = self
            .run(dir, &["worktree", "remove", &path_arg, "--force"])
            .await;

        if path.exists() {
            tokio::fs::remove_dir_all(path).await?;
        }
        result.map(|_| ())
    }

    async fn add(&self, dir: &Path, paths: &[PathBuf]) -> Result<()> {
        if paths.is_empty() {
            return Err(RemoteError::GitCommand {
                command: "add".to_string(),
                stderr: "no paths specified".to_string(),
            });
        }

        let paths: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect();
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));

        self.run(dir, &args).await.map(|_| ())
    }

    async fn commit(&self, dir: &Path, message: &str) -> Result<()> {
        self.run(dir, &["commit", "--message", message])
            .await
            .map(|_| ())
    }

    async fn push(&self, dir: &Path, args: &[String]) -> Result<()> {
        let mut all = vec!["push"];
        all.extend(args.iter().map(String::as_str));
        self.run(dir, &all).await.map(|_| ())
    }

    async fn push_url(&self, remote: &str, token: &str) -> Result<String> {
        let url = self
            .run(Path::new(""), &["remote", "get-url", "--push", remote])
            .await?;
        push_url_with_token(&url, token)
    }
}

/// Embed `token` into a remote URL as `x-access-token` credentials
///
/// SSH remotes (`git@github.com:owner/repo.git`, `ssh://git@host/path`) are
/// rewritten to HTTPS since tokens only work over HTTPS.
pub fn push_url_with_token(remote_url: &str, token: &str) -> Result<String> {
    let https = if let Some(rest) = remote_url.strip_prefix("ssh://") {
        let without_user = rest.split_once('@').map_or(rest, |(_, host)| host);
        format!("https://{}", without_user)
    } else if !remote_url.contains("://") {
        let without_user = remote_url
            .split_once('@')
            .map_or(remote_url, |(_, host)| host);
        let (host, path) = without_user
            .split_once(':')
            .ok_or_else(|| RemoteError::UnsupportedRemote {
                url: remote_url.to_string(),
            })?;
        format!("https://{}/{}", host, path.trim_start_matches('/'))
    } else {
        remote_url.to_string()
    };

    let mut url = Url::parse(&https).map_err(|e| RemoteError::InvalidUrl {
        url: remote_url.to_string(),
        reason: e.to_string(),
    })?;
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(RemoteError::UnsupportedRemote {
            url: remote_url.to_string(),
        });
    }

    url.set_username("x-access-token")
        .and_then(|_| url.set_password(Some(token)))
        .map_err(|_| RemoteError::UnsupportedRemote {
            url: remote_url.to_string(),
        })?;

    Ok(url.to_string())
}

/// Hide credentials embedded in URLs before logging
fn redact(text: &str) -> String {
    text.split(' ')
        .map(|word| match (word.find("://"), word.find('@')) {
            (Some(scheme), Some(at)) if at > scheme => {
                format!("{}://***{}", &word[..scheme], &word[at..])
            }
            _ => word.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
