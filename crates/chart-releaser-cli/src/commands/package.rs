//! Package command - create versioned chart archives

use chart_releaser_core::{create_archive, digest_file};
use console::style;
use std::path::{Path, PathBuf};

use crate::error::Result;

pub fn run(charts: &[PathBuf], output: &Path) -> Result<()> {
    for chart in charts {
        println!(
            "{} {}",
            style("Packaging").cyan().bold(),
            chart.display()
        );

        let archive = create_archive(chart, output)?;
        let digest = digest_file(&archive)?;

        println!("  {} {}", style("Created").green().bold(), archive.display());
        println!("  {} sha256:{}", style("Digest").dim(), digest.get(..16).unwrap_or(&digest));
    }

    Ok(())
}
