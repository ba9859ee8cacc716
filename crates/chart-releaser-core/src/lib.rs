//! chart-releaser core - chart archives and repository index documents
//!
//! This crate provides the data types shared by the release workflow:
//! - `ChartMetadata`: the `Chart.yaml` of a packaged chart
//! - `LoadedChart`: a chart archive opened from disk, with its digest
//! - `IndexFile`: the Helm-compatible `index.yaml` document
//! - `create_archive`: packaging of a chart directory into `<name>-<version>.tgz`

pub mod archive;
pub mod chart;
pub mod error;
pub mod index;

pub use archive::{create_archive, default_archive_name};
pub use chart::{ChartMetadata, LoadedChart, Maintainer, digest_file};
pub use error::{CoreError, Result};
pub use index::{ChartVersion, IndexFile};
