//! CLI error types with exit code handling

use chart_releaser_core::CoreError;
use chart_releaser_remote::RemoteError;
use chart_releaser_workflow::ReleaseError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI error carrying its exit code class
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Options missing or inconsistent
    #[error("Configuration error: {message}")]
    #[diagnostic(code(cr::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Chart archive or chart directory problem
    #[error("Chart error: {message}")]
    #[diagnostic(code(cr::chart))]
    Chart {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// GitHub API or git failure
    #[error("Remote error: {message}")]
    #[diagnostic(code(cr::remote))]
    Remote {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Some packages could not be released
    #[error("{message}")]
    #[diagnostic(code(cr::release))]
    Release { message: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(cr::io))]
    Io { message: String },

    #[error("{message}")]
    #[diagnostic(code(cr::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Chart { .. } => exit_codes::CHART_ERROR,
            CliError::Remote { .. } => exit_codes::REMOTE_ERROR,
            CliError::Release { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn config(message: impl Into<String>, help: Option<&str>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.map(str::to_string),
        }
    }

    pub fn chart(message: impl Into<String>) -> Self {
        Self::Chart {
            message: message.into(),
            help: None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => e.into(),
            CoreError::ChartNotFound { .. } => CliError::Chart {
                message: err.to_string(),
                help: Some("A chart directory must contain a Chart.yaml".to_string()),
            },
            other => CliError::chart(other.to_string()),
        }
    }
}

impl From<RemoteError> for CliError {
    fn from(err: RemoteError) -> Self {
        let help = match &err {
            RemoteError::Api { status: 401, .. } => Some("Check --token / CR_TOKEN"),
            RemoteError::Api { status: 403, .. } | RemoteError::Api { status: 404, .. } => {
                Some("Check that the token can access --owner/--git-repo")
            }
            RemoteError::UnsupportedRemote { .. } => {
                Some("Use an https or ssh remote, or pass --remote")
            }
            _ => None,
        };
        CliError::Remote {
            message: err.to_string(),
            help: help.map(str::to_string),
        }
    }
}

impl From<ReleaseError> for CliError {
    fn from(err: ReleaseError) -> Self {
        match err {
            ReleaseError::InvalidConfig { message } => CliError::config(
                message,
                Some("Set it in cr.yaml, with a flag, or through a CR_* environment variable"),
            ),
            ReleaseError::Template { message } => CliError::config(
                message,
                Some("Templates can use {{ .Name }} and {{ .Version }}"),
            ),
            ReleaseError::PackagePathNotFound { .. } => CliError::config(
                err.to_string(),
                Some("Run `cr package` first or pass --package-path"),
            ),
            ReleaseError::MalformedPackageName { .. } => CliError::chart(err.to_string()),
            ReleaseError::Chart(e) => e.into(),
            ReleaseError::Remote(e) => e.into(),
            ReleaseError::Io(e) => e.into(),
            ReleaseError::Batch { .. } => CliError::Release {
                message: err.to_string(),
            },
            ReleaseError::Serialization(message) => CliError::Other { message },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
