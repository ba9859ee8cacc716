//! Packaging of chart directories into `.tgz` archives
//!
//! Archives follow the Helm layout: every file is stored under a
//! top-level directory named after the chart.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::{Builder, Header};
use walkdir::WalkDir;

use crate::chart::{CHART_FILE, ChartMetadata};
use crate::error::{CoreError, Result};

/// Package a chart directory into `<output_dir>/<name>-<version>.tgz`
///
/// Returns the path to the created archive file.
pub fn create_archive(chart_dir: &Path, output_dir: &Path) -> Result<PathBuf> {
    let chart_yaml = chart_dir.join(CHART_FILE);
    if !chart_yaml.is_file() {
        return Err(CoreError::ChartNotFound {
            path: chart_dir.display().to_string(),
        });
    }
    let metadata = ChartMetadata::from_yaml(&std::fs::read_to_string(&chart_yaml)?)?;

    std::fs::create_dir_all(output_dir)?;
    let output = output_dir.join(default_archive_name(&metadata));

    let file = File::create(&output)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    let walker = WalkDir::new(chart_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| CoreError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel_path = entry
            .path()
            .strip_prefix(chart_dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        let archive_path = format!("{}/{}", metadata.name, rel_path);

        let content = std::fs::read(entry.path())?;
        add_bytes_to_archive(&mut builder, &archive_path, &content)?;
    }

    let encoder = builder.into_inner()?;
    encoder.finish()?;

    tracing::debug!("Packaged {} into {}", chart_dir.display(), output.display());

    Ok(output)
}

/// Add bytes to a tar archive with a given path
fn add_bytes_to_archive<W: Write>(
    builder: &mut Builder<W>,
    archive_path: &str,
    content: &[u8],
) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0); // Reproducible builds: use epoch time
    header.set_cksum();

    builder.append_data(&mut header, archive_path, content)?;

    Ok(())
}

/// Generate the archive filename for a chart
#[must_use]
pub fn default_archive_name(metadata: &ChartMetadata) -> String {
    format!("{}-{}.tgz", metadata.name, metadata.version)
}
