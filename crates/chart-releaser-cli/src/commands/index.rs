//! Index command - merge published releases into index.yaml

use chart_releaser_workflow::{Options, Releaser};
use console::style;

use crate::error::Result;

pub async fn run(options: Options) -> Result<()> {
    options.validate_for_index()?;

    let index_path = options.index_path.clone();
    let publishing = if options.pr {
        Some("pull request")
    } else if options.push {
        Some("push")
    } else {
        None
    };

    let releaser = Releaser::from_options(options)?;
    let updated = releaser.update_index_file().await?;

    if !updated {
        println!(
            "{} {} is up to date",
            style("Index").cyan().bold(),
            index_path.display()
        );
        return Ok(());
    }

    println!(
        "{} {}",
        style("Updated").green().bold(),
        index_path.display()
    );
    if let Some(mode) = publishing {
        println!(
            "  {} {} via {}",
            style("Published").green(),
            releaser.options().pages_branch,
            mode
        );
    }

    Ok(())
}
