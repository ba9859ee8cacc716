//! Discovery of packaged charts in a directory

use chart_releaser_core::IndexFile;
use semver::Version;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};

/// Extension of packaged charts
pub const PACKAGE_EXTENSION: &str = "tgz";

/// A packaged chart found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPackage {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
}

/// Split `<name>-<version>` into its parts
///
/// Hyphen-delimited segments are scanned from the end; the first boundary
/// whose suffix parses as SemVer wins, so `foo-bar-1.2.3-rc.1` splits into
/// `foo-bar` and `1.2.3-rc.1`. When no suffix is strict SemVer the last
/// hyphen is used if the suffix starts with a digit (`foo-1.2`).
///
/// Input without a usable hyphen is a broken precondition and yields
/// [`ReleaseError::MalformedPackageName`].
pub fn split_package_name_and_version(stem: &str) -> Result<(String, String)> {
    let malformed = || ReleaseError::MalformedPackageName {
        file: stem.to_string(),
    };

    let split_at = |idx: usize| (stem[..idx].to_string(), stem[idx + 1..].to_string());

    let hyphens: Vec<usize> = stem
        .match_indices('-')
        .map(|(idx, _)| idx)
        .filter(|&idx| idx > 0)
        .collect();

    if let Some(&idx) = hyphens
        .iter()
        .rev()
        .find(|&&idx| Version::parse(&stem[idx + 1..]).is_ok())
    {
        return Ok(split_at(idx));
    }

    match hyphens.last() {
        Some(&idx) if stem[idx + 1..].starts_with(|c: char| c.is_ascii_digit()) => Ok(split_at(idx)),
        _ => Err(malformed()),
    }
}

/// List packaged charts in `dir`, sorted by path
///
/// With `skip_existing` set, packages already present in `index` are left out.
pub fn scan_packages(
    dir: &Path,
    index: Option<&IndexFile>,
    skip_existing: bool,
) -> Result<Vec<ChartPackage>> {
    if !dir.is_dir() {
        return Err(ReleaseError::PackagePathNotFound {
            path: dir.display().to_string(),
        });
    }

    let paths = package_paths(std::fs::read_dir(dir)?.map(|entry| entry.map(|e| e.path())))?;

    let mut packages = Vec::with_capacity(paths.len());
    for path in paths {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let (name, version) = split_package_name_and_version(&stem)?;

        if skip_existing && index.is_some_and(|idx| idx.has(&name, &version)) {
            tracing::info!("Skipping {} {}: already in index", name, version);
            continue;
        }

        packages.push(ChartPackage {
            name,
            version,
            path,
        });
    }

    Ok(packages)
}

/// Keep the `.tgz` files among directory entries, sorted
///
/// An unreadable entry fails the whole listing.
fn package_paths(
    entries: impl IntoIterator<Item = std::io::Result<PathBuf>>,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?;
        if path.is_file() && path.extension().is_some_and(|ext| ext == PACKAGE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
