//! GitHub REST API release store

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{RemoteError, Result};
use crate::release::{Asset, Release, ReleaseStore};

const DEFAULT_API_URL: &str = "https://api.github.com/";
const DEFAULT_UPLOAD_URL: &str = "https://uploads.github.com/";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Connection settings for the GitHub API
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository that receives the releases
    pub repo: String,
    /// API token
    pub token: String,
    /// REST API base URL
    pub api_url: String,
    /// Asset upload base URL
    pub upload_url: String,
}

impl GitHubConfig {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
        }
    }

    /// Override the API and upload base URLs (GitHub Enterprise, tests)
    pub fn with_urls(mut self, api_url: impl Into<String>, upload_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self.upload_url = upload_url.into();
        self
    }
}

/// GitHub-backed [`ReleaseStore`]
pub struct GitHubClient {
    client: reqwest::Client,
    config: GitHubConfig,
    api_base: Url,
    upload_base: Url,
}

impl GitHubClient {
    /// Create a new client
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("chart-releaser/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RemoteError::Network {
                message: e.to_string(),
            })?;

        let api_base = base_url(&config.api_url)?;
        let upload_base = base_url(&config.upload_url)?;

        Ok(Self {
            client,
            config,
            api_base,
            upload_base,
        })
    }

    fn repo_url(&self, base: &Url, owner: &str, repo: &str, rest: &str) -> Result<Url> {
        Ok(base.join(&format!("repos/{}/{}/{}", owner, repo, rest))?)
    }

    async fn upload_asset(&self, release_id: u64, asset: &Asset) -> Result<Asset> {
        let file_name = asset.file_name();
        let mut url = self.repo_url(
            &self.upload_base,
            &self.config.owner,
            &self.config.repo,
            &format!("releases/{}/assets", release_id),
        )?;
        url.query_pairs_mut().append_pair("name", &file_name);

        let data = tokio::fs::read(&asset.path).await?;
        tracing::debug!("Uploading {} ({} bytes)", file_name, data.len());

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(data)
            .send()
            .await?;
        let uploaded: AssetResponse = check(response, &file_name).await?.json().await?;

        Ok(Asset {
            path: asset.path.clone(),
            url: Some(uploaded.browser_download_url),
        })
    }

    async fn delete_release(&self, release_id: u64) -> Result<()> {
        let url = self.repo_url(
            &self.api_base,
            &self.config.owner,
            &self.config.repo,
            &format!("releases/{}", release_id),
        )?;

        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await?;
        check(response, &format!("release {}", release_id)).await?;
        Ok(())
    }
}

#[async_trait]
impl ReleaseStore for GitHubClient {
    async fn create_release(&self, release: &Release) -> Result<Release> {
        let url = self.repo_url(&self.api_base, &self.config.owner, &self.config.repo, "releases")?;
        let request = CreateReleaseRequest {
            tag_name: &release.name,
            name: &release.name,
            body: &release.description,
            target_commitish: (!release.commit.is_empty()).then_some(release.commit.as_str()),
            generate_release_notes: release.generate_release_notes,
            make_latest: if release.make_latest { "true" } else { "false" },
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .json(&request)
            .send()
            .await?;
        let created: ReleaseResponse = check(response, &release.name).await?.json().await?;

        tracing::debug!("Created release {} (id {})", release.name, created.id);

        // An upload failure deletes the release so the next run recreates it.
        let mut assets = Vec::with_capacity(release.assets.len());
        for asset in &release.assets {
            match self.upload_asset(created.id, asset).await {
                Ok(uploaded) => assets.push(uploaded),
                Err(e) => {
                    if let Err(cleanup_err) = self.delete_release(created.id).await {
                        tracing::warn!(
                            "Failed to delete incomplete release {}: {}",
                            release.name,
                            cleanup_err
                        );
                    }
                    return Err(e);
                }
            }
        }

        Ok(Release {
            assets,
            ..release.clone()
        })
    }

    async fn get_release(&self, tag: &str) -> Result<Release> {
        let url = self.repo_url(
            &self.api_base,
            &self.config.owner,
            &self.config.repo,
            &format!("releases/tags/{}", tag),
        )?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .send()
            .await?;
        let found: ReleaseResponse = check(response, &format!("release {}", tag))
            .await?
            .json()
            .await?;

        Ok(Release {
            name: found.name.unwrap_or_else(|| tag.to_string()),
            description: found.body.unwrap_or_default(),
            commit: found.target_commitish.unwrap_or_default(),
            assets: found
                .assets
                .into_iter()
                .map(|a| Asset {
                    path: PathBuf::from(a.name),
                    url: Some(a.browser_download_url),
                })
                .collect(),
            generate_release_notes: false,
            make_latest: false,
        })
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        message: &str,
        head: &str,
        base: &str,
    ) -> Result<String> {
        let url = self.repo_url(&self.api_base, owner, repo, "pulls")?;
        let request = PullRequestRequest {
            title: message,
            head,
            base,
            body: message,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .json(&request)
            .send()
            .await?;
        let pr: PullRequestResponse = check(response, &format!("{}/{}", owner, repo))
            .await?
            .json()
            .await?;

        Ok(pr.html_url)
    }
}

/// Parse a base URL, making sure relative joins keep its path
fn base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    };
    Url::parse(&normalized).map_err(|e| RemoteError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Map non-success statuses to errors
async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(RemoteError::NotFound {
            what: what.to_string(),
        });
    }

    let message = response.text().await.unwrap_or_default();
    Err(RemoteError::Api {
        status: status.as_u16(),
        message,
    })
}

#[derive(Serialize)]
struct CreateReleaseRequest<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_commitish: Option<&'a str>,
    generate_release_notes: bool,
    make_latest: &'a str,
}

#[derive(Deserialize)]
struct ReleaseResponse {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    target_commitish: Option<String>,
    #[serde(default)]
    assets: Vec<AssetResponse>,
}

#[derive(Deserialize)]
struct AssetResponse {
    name: String,
    browser_download_url: String,
}

#[derive(Serialize)]
struct PullRequestRequest<'a> {
    title: &'a str,
    head: &'a str,
    base: &'a str,
    body: &'a str,
}

#[derive(Deserialize)]
struct PullRequestResponse {
    html_url: String,
}
