//! Error types for remote operations

use thiserror::Error;

/// Errors raised by the release store, git worker and index fetcher
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timeout after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("git {command} failed: {stderr}")]
    GitCommand { command: String, stderr: String },

    #[error("Unsupported git remote URL: {url}")]
    UnsupportedRemote { url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RemoteError {
    /// Whether the remote reported the object as absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }
}

/// Result type for remote operations
pub type Result<T> = std::result::Result<T, RemoteError>;

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Timeout { seconds: 30 }
        } else if e.is_connect() {
            RemoteError::Network {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            RemoteError::Api {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            RemoteError::Network {
                message: e.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        RemoteError::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for RemoteError {
    fn from(e: url::ParseError) -> Self {
        RemoteError::InvalidUrl {
            url: String::new(),
            reason: e.to_string(),
        }
    }
}
