//! cr - publish packaged Helm charts as GitHub releases

use clap::{Args, Parser, Subcommand};
use chart_releaser_workflow::Options;
use std::path::PathBuf;

mod commands;
mod error;
mod exit_codes;

use error::Result;

#[derive(Parser)]
#[command(name = "cr")]
#[command(author = "chart-releaser contributors")]
#[command(version)]
#[command(about = "Host Helm charts via GitHub Pages and Releases", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ./cr.yaml, then ~/.config/cr/cr.yaml)
    #[arg(long, global = true, env = "CR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload chart packages as GitHub releases
    Upload {
        #[command(flatten)]
        repo: RepoArgs,

        /// Target commit for the release tags
        #[arg(short, long, env = "CR_COMMIT")]
        commit: Option<String>,

        /// Markdown file inside the chart used as release notes
        #[arg(long, env = "CR_RELEASE_NOTES_FILE")]
        release_notes_file: Option<String>,

        /// Let GitHub generate release notes
        #[arg(long, env = "CR_GENERATE_RELEASE_NOTES")]
        generate_release_notes: bool,

        /// Mark the created releases as latest
        #[arg(long, env = "CR_MAKE_RELEASE_LATEST")]
        make_release_latest: Option<bool>,

        /// Skip packages already present in the local index
        #[arg(long, env = "CR_SKIP_EXISTING")]
        skip_existing: bool,

        /// Local index used by --skip-existing
        #[arg(short, long, env = "CR_INDEX_PATH")]
        index_path: Option<PathBuf>,
    },

    /// Update the chart repository index file
    Index {
        #[command(flatten)]
        repo: RepoArgs,

        /// Local path of the index file
        #[arg(short, long, env = "CR_INDEX_PATH")]
        index_path: Option<PathBuf>,

        /// Published chart repository URL (defaults to GitHub Pages)
        #[arg(long, env = "CR_CHARTS_REPO")]
        charts_repo: Option<String>,

        /// Path of the index file inside the pages branch
        #[arg(long, env = "CR_PAGES_INDEX_PATH")]
        pages_index_path: Option<PathBuf>,
    },

    /// Package chart directories into versioned archives
    Package {
        /// Chart directories to package
        #[arg(default_value = ".")]
        charts: Vec<PathBuf>,

        /// Output directory for the archives
        #[arg(short, long, env = "CR_PACKAGE_PATH")]
        package_path: Option<PathBuf>,
    },
}

/// Flags shared by `upload` and `index`
#[derive(Args)]
struct RepoArgs {
    /// GitHub username or organization
    #[arg(short, long, env = "CR_OWNER")]
    owner: Option<String>,

    /// GitHub repository
    #[arg(short = 'r', long, env = "CR_GIT_REPO")]
    git_repo: Option<String>,

    /// GitHub auth token
    #[arg(short, long, env = "CR_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API base URL
    #[arg(short = 'b', long, env = "CR_GIT_BASE_URL")]
    git_base_url: Option<String>,

    /// GitHub upload URL
    #[arg(short = 'u', long, env = "CR_GIT_UPLOAD_URL")]
    git_upload_url: Option<String>,

    /// Directory holding the chart packages
    #[arg(short, long, env = "CR_PACKAGE_PATH")]
    package_path: Option<PathBuf>,

    /// Template for release names
    #[arg(long, env = "CR_RELEASE_NAME_TEMPLATE")]
    release_name_template: Option<String>,

    /// Host packages next to the index in the pages branch
    #[arg(long, env = "CR_PACKAGES_WITH_INDEX")]
    packages_with_index: bool,

    /// Push changes to the pages branch
    #[arg(long, env = "CR_PUSH", conflicts_with = "pr")]
    push: bool,

    /// Open a pull request against the pages branch
    #[arg(long, env = "CR_PR")]
    pr: bool,

    /// Git remote used when pushing
    #[arg(long, env = "CR_REMOTE")]
    remote: Option<String>,

    /// Branch serving the chart repository
    #[arg(long, env = "CR_PAGES_BRANCH")]
    pages_branch: Option<String>,
}

impl RepoArgs {
    fn apply(self, options: &mut Options) {
        override_with(&mut options.owner, self.owner);
        override_with(&mut options.git_repo, self.git_repo);
        override_with(&mut options.token, self.token);
        override_with(&mut options.git_base_url, self.git_base_url);
        override_with(&mut options.git_upload_url, self.git_upload_url);
        override_with(&mut options.package_path, self.package_path);
        override_with(&mut options.release_name_template, self.release_name_template);
        override_with(&mut options.remote, self.remote);
        override_with(&mut options.pages_branch, self.pages_branch);
        options.packages_with_index |= self.packages_with_index;
        options.push |= self.push;
        options.pr |= self.pr;
    }
}

fn override_with<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

fn init_logging(debug: bool) {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("chart_releaser", level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut options = Options::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Upload {
            repo,
            commit,
            release_notes_file,
            generate_release_notes,
            make_release_latest,
            skip_existing,
            index_path,
        } => {
            repo.apply(&mut options);
            override_with(&mut options.commit, commit);
            override_with(&mut options.index_path, index_path);
            override_with(&mut options.make_release_latest, make_release_latest);
            if release_notes_file.is_some() {
                options.release_notes_file = release_notes_file;
            }
            options.generate_release_notes |= generate_release_notes;
            options.skip_existing |= skip_existing;

            commands::upload::run(options).await
        }

        Commands::Index {
            repo,
            index_path,
            charts_repo,
            pages_index_path,
        } => {
            repo.apply(&mut options);
            override_with(&mut options.index_path, index_path);
            override_with(&mut options.pages_index_path, pages_index_path);
            if charts_repo.is_some() {
                options.charts_repo = charts_repo;
            }

            commands::index::run(options).await
        }

        Commands::Package {
            charts,
            package_path,
        } => {
            override_with(&mut options.package_path, package_path);
            commands::package::run(&charts, &options.package_path)
        }
    }
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
