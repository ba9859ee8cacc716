//! Merging published chart archives into an index document

use chart_releaser_core::{ChartVersion, IndexFile, LoadedChart};
use std::path::Path;
use url::Url;

use crate::error::Result;

/// How an index entry refers to its archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlLayout {
    /// Full public download URL (archives live in the release store)
    Absolute,
    /// Archive file name only (archives are served next to the index)
    RelativeToIndex,
}

impl UrlLayout {
    pub fn from_packages_with_index(packages_with_index: bool) -> Self {
        if packages_with_index {
            UrlLayout::RelativeToIndex
        } else {
            UrlLayout::Absolute
        }
    }

    fn entry_url(self, public_url: &str) -> String {
        match self {
            UrlLayout::Absolute => public_url.to_string(),
            UrlLayout::RelativeToIndex => url_basename(public_url),
        }
    }
}

/// Last path segment of a URL
pub fn url_basename(public_url: &str) -> String {
    Url::parse(public_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty())
        .unwrap_or_else(|| {
            public_url
                .rsplit('/')
                .next()
                .unwrap_or(public_url)
                .to_string()
        })
}

/// Add the chart at `archive_path` to `index`, downloadable from `public_url`
///
/// An entry with the same name and version is replaced. Fails with a
/// not-found error when the archive does not exist and leaves `index`
/// untouched on any error.
pub fn add_to_index(
    index: &mut IndexFile,
    archive_path: &Path,
    public_url: &str,
    layout: UrlLayout,
) -> Result<()> {
    let chart = LoadedChart::load(archive_path)?;
    let digest = chart.digest()?;
    let url = layout.entry_url(public_url);

    tracing::debug!(
        "Indexing {} {} as {}",
        chart.metadata.name,
        chart.metadata.version,
        url
    );

    index.upsert(ChartVersion::new(chart.metadata, url, digest));
    Ok(())
}
