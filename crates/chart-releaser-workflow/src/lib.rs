//! Release-and-index reconciliation for packaged Helm charts
//!
//! Two workflows share one [`Releaser`]:
//!
//! - [`Releaser::create_releases`] turns every packaged chart in the package
//!   directory into a release, skipping versions that already have one.
//! - [`Releaser::update_index_file`] merges the published releases into the
//!   repository `index.yaml` and optionally commits it to the pages branch.
//!
//! All collaborators (release store, git, index fetcher) are traits from
//! `chart-releaser-remote`, so the workflow can run against fakes.
//!
//! ```no_run
//! use chart_releaser_workflow::{Options, Releaser};
//!
//! # async fn run() -> chart_releaser_workflow::Result<()> {
//! let options = Options {
//!     owner: "my-org".to_string(),
//!     git_repo: "charts".to_string(),
//!     token: std::env::var("CR_TOKEN").unwrap_or_default(),
//!     ..Default::default()
//! };
//! options.validate_for_upload()?;
//!
//! let releaser = Releaser::from_options(options)?;
//! let report = releaser.create_releases().await?;
//! println!("{} created, {} skipped", report.created.len(), report.skipped.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod merge;
pub mod publish;
pub mod releaser;
pub mod scanner;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{DEFAULT_RELEASE_NAME_TEMPLATE, Options};
pub use error::{PackageFailure, ReleaseError, Result};
pub use merge::{UrlLayout, add_to_index};
pub use publish::PublishFile;
pub use releaser::{ReleaseReport, Releaser};
pub use scanner::{ChartPackage, scan_packages, split_package_name_and_version};
pub use template::ReleaseNameTemplate;
