//! chart-releaser remote collaborators
//!
//! The release workflow talks to the outside world through three narrow
//! traits, each with a real implementation here:
//!
//! - [`ReleaseStore`]: create and look up releases, open pull requests
//!   ([`GitHubClient`])
//! - [`GitWorker`]: worktrees, staging, commits and pushes ([`Git`], which
//!   shells out to the `git` binary)
//! - [`IndexFetcher`]: download a published `index.yaml`
//!   ([`HttpIndexFetcher`])
//!
//! ## Example
//!
//! ```rust,no_run
//! use chart_releaser_remote::{GitHubClient, GitHubConfig, ReleaseStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitHubClient::new(GitHubConfig::new("owner", "charts", "ghp_token"))?;
//! let release = client.get_release("nginx-15.0.0").await?;
//! println!("{} has {} assets", release.name, release.assets.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod git;
pub mod github;
pub mod http;
pub mod release;

pub use error::{RemoteError, Result};
pub use git::{Git, GitWorker, push_url_with_token};
pub use github::{GitHubClient, GitHubConfig};
pub use http::{HttpIndexFetcher, IndexFetcher};
pub use release::{Asset, Release, ReleaseStore};
