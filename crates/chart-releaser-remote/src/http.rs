//! Fetching a published `index.yaml` over HTTP

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{RemoteError, Result};

/// Source of remote index documents
#[async_trait]
pub trait IndexFetcher: Send + Sync {
    /// Fetch the raw bytes at `url`
    ///
    /// Any non-200 status is reported as `RemoteError::NotFound`; transport
    /// failures are returned as-is.
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed [`IndexFetcher`]
pub struct HttpIndexFetcher {
    client: reqwest::Client,
}

impl HttpIndexFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RemoteError::Network {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl IndexFetcher for HttpIndexFetcher {
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!("{} returned {}", url, response.status());
            return Err(RemoteError::NotFound {
                what: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/charts/index.yaml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("apiVersion: v1\n"))
            .mount(&server)
            .await;

        let body = HttpIndexFetcher::new()
            .unwrap()
            .get(&format!("{}/charts/index.yaml", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, b"apiVersion: v1\n");
    }

    #[tokio::test]
    async fn test_non_200_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = HttpIndexFetcher::new()
            .unwrap()
            .get(&format!("{}/index.yaml", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_transport_error_is_fatal() {
        // Nothing listens on port 9 (discard) on test hosts
        let err = HttpIndexFetcher::new()
            .unwrap()
            .get("http://127.0.0.1:9/index.yaml")
            .await
            .unwrap_err();
        assert!(!err.is_not_found());
    }
}
