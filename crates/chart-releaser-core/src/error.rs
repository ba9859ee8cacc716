//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Chart archive not found: {path}")]
    ChartNotFound { path: String },

    #[error("Invalid chart archive {path}: {message}")]
    InvalidChart { path: String, message: String },

    #[error("File not found in chart archive {path}: {file}")]
    FileNotInArchive { path: String, file: String },

    #[error("Invalid Chart.yaml: {message}")]
    InvalidMetadata { message: String },

    #[error("Index parse error: {message}")]
    IndexParse { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),
}

impl CoreError {
    /// Whether this error means the chart archive is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::ChartNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
