//! Upload command - create GitHub releases for packaged charts

use chart_releaser_workflow::{Options, Releaser};
use console::style;

use crate::error::Result;

pub async fn run(options: Options) -> Result<()> {
    options.validate_for_upload()?;

    println!(
        "{} {} to {}/{}",
        style("Releasing").cyan().bold(),
        options.package_path.display(),
        options.owner,
        options.git_repo
    );

    let releaser = Releaser::from_options(options)?;
    let report = releaser.create_releases().await?;

    for name in &report.skipped {
        println!("  {} {} (already released)", style("Skipped").dim(), name);
    }
    for release in &report.created {
        println!("  {} {}", style("Created").green().bold(), release.name);
        for url in release.assets.iter().filter_map(|a| a.url.as_deref()) {
            println!("    {}", style(url).dim());
        }
    }

    println!();
    println!(
        "{} {} created, {} skipped",
        style("Done:").bold(),
        report.created.len(),
        report.skipped.len()
    );

    Ok(())
}
