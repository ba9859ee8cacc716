//! Error types for the release workflow

use std::fmt;
use std::path::PathBuf;

use chart_releaser_core::CoreError;
use chart_releaser_remote::RemoteError;
use thiserror::Error;

/// Release workflow errors
#[derive(Debug, Error)]
pub enum ReleaseError {
    // ============ Input Errors ============
    #[error("Package path does not exist or is not a directory: {path}")]
    PackagePathNotFound { path: String },

    /// A package filename has no `-<version>` suffix.
    ///
    /// Callers are expected to hand the scanner `<name>-<version>.tgz` files
    /// only; hitting this means that precondition was broken.
    #[error("Malformed package filename '{file}': expected <name>-<version>.tgz")]
    MalformedPackageName { file: String },

    #[error("Invalid release name template: {message}")]
    Template { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ============ Batch Errors ============
    #[error("{}", format_batch(.failures, .created, .publish.as_deref()))]
    Batch {
        failures: Vec<PackageFailure>,
        created: Vec<String>,
        /// Publishing the created archives to the pages branch also failed
        publish: Option<Box<ReleaseError>>,
    },

    // ============ Wrapped Errors ============
    #[error(transparent)]
    Chart(#[from] CoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_yaml::Error> for ReleaseError {
    fn from(e: serde_yaml::Error) -> Self {
        ReleaseError::Serialization(e.to_string())
    }
}

impl From<minijinja::Error> for ReleaseError {
    fn from(e: minijinja::Error) -> Self {
        ReleaseError::Template {
            message: e.to_string(),
        }
    }
}

/// Result type for workflow operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// One package that could not be released
#[derive(Debug)]
pub struct PackageFailure {
    /// Archive the failure belongs to
    pub package: PathBuf,
    pub error: ReleaseError,
}

impl fmt::Display for PackageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.package.display(), self.error)
    }
}

fn format_batch(
    failures: &[PackageFailure],
    created: &[String],
    publish: Option<&ReleaseError>,
) -> String {
    let mut message = format!(
        "{} of {} package(s) failed to release:",
        failures.len(),
        failures.len() + created.len()
    );
    for failure in failures {
        message.push_str(&format!("\n  - {}", failure));
    }
    if let Some(error) = publish {
        message.push_str(&format!("\npublishing the created packages also failed: {}", error));
    }
    message
}
