//! Committing files into the pages branch
//!
//! Every publication runs as one worktree transaction: check out
//! `<remote>/<pages-branch>` into a temporary worktree, copy the files in,
//! stage, commit, then either push to the pages branch or push a
//! throwaway branch and open a pull request. The worktree is removed on
//! every exit path.

use chart_releaser_remote::{GitWorker, ReleaseStore};
use rand::Rng;
use rand::distr::Alphanumeric;
use std::path::{Path, PathBuf};

use crate::config::Options;
use crate::error::Result;

/// A local file and where it goes inside the pages branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFile {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl PublishFile {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

pub(crate) struct BranchPublisher<'a> {
    options: &'a Options,
    store: &'a dyn ReleaseStore,
    git: &'a dyn GitWorker,
}

impl<'a> BranchPublisher<'a> {
    pub(crate) fn new(
        options: &'a Options,
        store: &'a dyn ReleaseStore,
        git: &'a dyn GitWorker,
    ) -> Self {
        Self {
            options,
            store,
            git,
        }
    }

    /// Run the transaction, returning the pull request URL in PR mode
    pub(crate) async fn publish(
        &self,
        files: &[PublishFile],
        message: &str,
    ) -> Result<Option<String>> {
        let committish = format!("{}/{}", self.options.remote, self.options.pages_branch);
        let worktree = self.git.add_worktree(Path::new(""), &committish).await?;
        tracing::debug!("Checked out {} into {}", committish, worktree.display());

        let result = self.commit_and_push(&worktree, files, message).await;
        let cleanup = self.git.remove_worktree(Path::new(""), &worktree).await;

        match (result, cleanup) {
            (Ok(pr_url), Ok(())) => Ok(pr_url),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup_err)) => {
                tracing::warn!(
                    "Failed to remove worktree {}: {}",
                    worktree.display(),
                    cleanup_err
                );
                Err(e)
            }
        }
    }

    async fn commit_and_push(
        &self,
        worktree: &Path,
        files: &[PublishFile],
        message: &str,
    ) -> Result<Option<String>> {
        let mut staged = Vec::with_capacity(files.len());
        for file in files {
            let dest = worktree.join(&file.target);
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(&file.source, &dest).await?;
            staged.push(file.target.clone());
        }

        self.git.add(worktree, &staged).await?;
        self.git.commit(worktree, message).await?;

        let push_url = self
            .git
            .push_url(&self.options.remote, &self.options.token)
            .await?;

        if !self.options.pr {
            let refspec = format!("HEAD:refs/heads/{}", self.options.pages_branch);
            self.git.push(worktree, &[push_url, refspec]).await?;
            tracing::info!("Pushed to {}", self.options.pages_branch);
            return Ok(None);
        }

        let branch = random_branch_name();
        let refspec = format!("HEAD:refs/heads/{}", branch);
        self.git.push(worktree, &[push_url, refspec]).await?;

        let pr_url = self
            .store
            .create_pull_request(
                &self.options.owner,
                &self.options.git_repo,
                message,
                &branch,
                &self.options.pages_branch,
            )
            .await?;
        tracing::info!("Opened pull request {}", pr_url);

        Ok(Some(pr_url))
    }
}

/// `chart-releaser-` followed by 16 random lowercase alphanumerics
fn random_branch_name() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("chart-releaser-{}", suffix)
}
