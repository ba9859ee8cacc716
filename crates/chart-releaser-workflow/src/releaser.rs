//! Release creation and index reconciliation

use chart_releaser_core::{CoreError, IndexFile, LoadedChart};
use chart_releaser_remote::{
    Asset, Git, GitHubClient, GitHubConfig, GitWorker, HttpIndexFetcher, IndexFetcher, Release,
    ReleaseStore,
};
use chrono::{TimeDelta, Utc};
use std::path::{Path, PathBuf};

use crate::config::Options;
use crate::error::{PackageFailure, ReleaseError, Result};
use crate::merge::{UrlLayout, add_to_index, url_basename};
use crate::publish::{BranchPublisher, PublishFile};
use crate::scanner::{ChartPackage, PACKAGE_EXTENSION, scan_packages, split_package_name_and_version};
use crate::template::ReleaseNameTemplate;

const PACKAGES_COMMIT_MESSAGE: &str = "Publishing chart packages";
const INDEX_COMMIT_MESSAGE: &str = "Update index.yaml";

/// Outcome of [`Releaser::create_releases`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReleaseReport {
    /// Releases created, with public asset URLs bound
    pub created: Vec<Release>,
    /// Names of releases that already existed
    pub skipped: Vec<String>,
}

enum PackageOutcome {
    Created(Release),
    Skipped(String),
}

/// Drives the release and index workflows against its collaborators
pub struct Releaser {
    options: Options,
    store: Box<dyn ReleaseStore>,
    git: Box<dyn GitWorker>,
    fetcher: Box<dyn IndexFetcher>,
    template: ReleaseNameTemplate,
}

impl Releaser {
    pub fn new(
        options: Options,
        store: Box<dyn ReleaseStore>,
        git: Box<dyn GitWorker>,
        fetcher: Box<dyn IndexFetcher>,
    ) -> Result<Self> {
        let template = ReleaseNameTemplate::new(&options.release_name_template)?;
        Ok(Self {
            options,
            store,
            git,
            fetcher,
            template,
        })
    }

    /// Wire up the GitHub client, the system `git` and an HTTP fetcher
    pub fn from_options(options: Options) -> Result<Self> {
        let github = GitHubClient::new(
            GitHubConfig::new(&options.owner, &options.git_repo, &options.token)
                .with_urls(&options.git_base_url, &options.git_upload_url),
        )?;

        Self::new(
            options,
            Box::new(github),
            Box::new(Git::new()),
            Box::new(HttpIndexFetcher::new()?),
        )
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    fn publisher(&self) -> BranchPublisher<'_> {
        BranchPublisher::new(&self.options, self.store.as_ref(), self.git.as_ref())
    }

    /// Create one release per package that does not have one yet
    ///
    /// Every package is attempted; failures are collected and returned
    /// together as [`ReleaseError::Batch`] once the batch is done.
    pub async fn create_releases(&self) -> Result<ReleaseReport> {
        let index = if self.options.skip_existing && self.options.index_path.is_file() {
            Some(IndexFile::load(&self.options.index_path)?)
        } else {
            None
        };

        let packages = scan_packages(
            &self.options.package_path,
            index.as_ref(),
            self.options.skip_existing,
        )?;

        let mut report = ReleaseReport::default();
        let mut failures = Vec::new();

        for package in &packages {
            match self.release_package(package).await {
                Ok(PackageOutcome::Created(release)) => {
                    tracing::info!("Created release {}", release.name);
                    report.created.push(release);
                }
                Ok(PackageOutcome::Skipped(name)) => report.skipped.push(name),
                Err(error) => {
                    tracing::warn!("Failed to release {}: {}", package.path.display(), error);
                    failures.push(PackageFailure {
                        package: package.path.clone(),
                        error,
                    });
                }
            }
        }

        let mut publish = None;
        if self.options.packages_with_index
            && self.options.publishes_to_branch()
            && !report.created.is_empty()
        {
            let files: Vec<PublishFile> = report
                .created
                .iter()
                .flat_map(|release| &release.assets)
                .map(|asset| PublishFile::new(&asset.path, asset.file_name()))
                .collect();
            if let Err(e) = self.publisher().publish(&files, PACKAGES_COMMIT_MESSAGE).await {
                if failures.is_empty() {
                    return Err(e);
                }
                publish = Some(Box::new(e));
            }
        }

        if !failures.is_empty() {
            return Err(ReleaseError::Batch {
                failures,
                created: report.created.iter().map(|r| r.name.clone()).collect(),
                publish,
            });
        }

        Ok(report)
    }

    async fn release_package(&self, package: &ChartPackage) -> Result<PackageOutcome> {
        let name = self.template.render(&package.name, &package.version)?;

        match self.store.get_release(&name).await {
            Ok(_) => {
                tracing::info!("Release {} already exists, skipping", name);
                return Ok(PackageOutcome::Skipped(name));
            }
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let chart = LoadedChart::load(&package.path)?;

        let mut assets = vec![Asset::local(package.path.clone())];
        let provenance = provenance_path(&package.path);
        if provenance.is_file() {
            assets.push(Asset::local(provenance));
        }

        let release = Release {
            description: self.release_notes(&chart)?,
            name,
            commit: self.options.commit.clone(),
            assets,
            generate_release_notes: self.options.generate_release_notes,
            make_latest: self.options.make_release_latest,
        };

        let created = self.store.create_release(&release).await?;
        Ok(PackageOutcome::Created(created))
    }

    /// Release body: the configured notes file from the archive, else the description
    fn release_notes(&self, chart: &LoadedChart) -> Result<String> {
        let description = chart.metadata.description.clone().unwrap_or_default();

        let Some(notes_file) = &self.options.release_notes_file else {
            return Ok(description);
        };

        match chart.read_file(notes_file) {
            Ok(content) => Ok(String::from_utf8_lossy(&content).into_owned()),
            Err(CoreError::FileNotInArchive { .. }) => {
                tracing::warn!(
                    "{} not found in {}, using the chart description",
                    notes_file,
                    chart.path.display()
                );
                Ok(description)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Merge published releases into the index file
    ///
    /// Returns `false` when a local index already existed and nothing new
    /// was merged; the file is left untouched in that case.
    pub async fn update_index_file(&self) -> Result<bool> {
        let index_path = &self.options.index_path;
        let existed = index_path.is_file();

        let mut index = if existed {
            tracing::debug!("Loading local index {}", index_path.display());
            IndexFile::load(index_path)?
        } else {
            self.fetch_remote_index().await?
        };
        let source_generated = index.generated;

        let packages = scan_packages(&self.options.package_path, None, false)?;
        let layout = UrlLayout::from_packages_with_index(self.options.packages_with_index);
        let mut merged: Vec<PathBuf> = Vec::new();

        for package in &packages {
            let name = self.template.render(&package.name, &package.version)?;
            let release = match self.store.get_release(&name).await {
                Ok(release) => release,
                Err(e) if e.is_not_found() => {
                    tracing::warn!("Release {} not found, not indexing it", name);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            for url in release.assets.iter().filter_map(|a| a.url.as_deref()) {
                let file_name = url_basename(url);
                let Some(stem) = file_name
                    .strip_suffix(PACKAGE_EXTENSION)
                    .and_then(|s| s.strip_suffix('.'))
                else {
                    continue;
                };

                let (chart, version) = split_package_name_and_version(stem)?;
                if index.has(&chart, &version) {
                    tracing::debug!("{} {} is already indexed", chart, version);
                    continue;
                }

                let archive = self.options.package_path.join(&file_name);
                add_to_index(&mut index, &archive, url, layout)?;
                tracing::info!("Added {} {} to the index", chart, version);
                merged.push(archive);
            }
        }

        if merged.is_empty() && existed {
            tracing::info!("Index {} is up to date", index_path.display());
            return Ok(false);
        }

        index.sort_entries();
        index.generated = std::cmp::max(Utc::now(), source_generated + TimeDelta::microseconds(1));
        index.write(index_path)?;
        tracing::info!("Wrote index {}", index_path.display());

        if self.options.publishes_to_branch() {
            let mut files = vec![PublishFile::new(
                index_path,
                &self.options.pages_index_path,
            )];
            if self.options.packages_with_index {
                files.extend(merged.iter().filter_map(|archive| {
                    archive
                        .file_name()
                        .map(|name| PublishFile::new(archive, PathBuf::from(name)))
                }));
            }
            self.publisher().publish(&files, INDEX_COMMIT_MESSAGE).await?;
        }

        Ok(true)
    }

    async fn fetch_remote_index(&self) -> Result<IndexFile> {
        let url = self.options.remote_index_url();
        match self.fetcher.get(&url).await {
            Ok(body) => {
                tracing::debug!("Using remote index {}", url);
                Ok(IndexFile::from_bytes(&body)?)
            }
            Err(e) if e.is_not_found() => {
                tracing::info!("No index at {}, starting a new one", url);
                Ok(IndexFile::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// `<archive>.prov`
fn provenance_path(archive: &Path) -> PathBuf {
    let mut path = archive.as_os_str().to_owned();
    path.push(".prov");
    PathBuf::from(path)
}
