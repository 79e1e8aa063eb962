//! Error taxonomy for a run.
//!
//! Per-item problems (a bad filename, an unreachable repository) are
//! [`CollectWarning`]s: logged, counted and otherwise contained. Only
//! configuration and output errors abort a run.

use std::path::PathBuf;
use std::time::Duration;

use ghpi_schema::{DigestError, FilenameError};
use reqwest::StatusCode;
use thiserror::Error;

/// A failed forge request.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("rate limited by forge at {url}")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl ForgeError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            Self::Status { status, .. } => {
                status.is_server_error() || *status == StatusCode::REQUEST_TIMEOUT
            }
            Self::RateLimited { .. } => true,
            Self::Decode { .. } => false,
        }
    }

    /// Delay requested by the forge before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// A contained, non-fatal problem found while collecting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectWarning {
    #[error("{repository}: skipping asset: {error}")]
    UnparsableFilename {
        repository: String,
        error: FilenameError,
    },

    #[error("{repository}: ignoring digest of {filename}: {error}")]
    InvalidDigest {
        repository: String,
        filename: String,
        error: DigestError,
    },

    #[error("{repository}: could not hash {filename}: {reason}")]
    HashFailed {
        repository: String,
        filename: String,
        reason: String,
    },

    #[error("{repository}: skipping repository: {reason}")]
    RepositoryUnavailable { repository: String, reason: String },
}

impl CollectWarning {
    /// The `owner/repo` the warning is about.
    pub fn repository(&self) -> &str {
        match self {
            Self::UnparsableFilename { repository, .. }
            | Self::InvalidDigest { repository, .. }
            | Self::HashFailed { repository, .. }
            | Self::RepositoryUnavailable { repository, .. } => repository,
        }
    }

    /// True if the warning dropped an asset from the index.
    pub fn skipped_asset(&self) -> bool {
        matches!(self, Self::UnparsableFilename { .. })
    }
}

/// Invalid configuration, detected before any network call.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no forge token: pass --token, --token-stdin or set GITHUB_TOKEN")]
    MissingToken,

    #[error("failed to read repository list {}: {source}", .path.display())]
    ReadRepositories {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid repository on line {line}: {reason}")]
    InvalidRepository { line: usize, reason: String },

    #[error("invalid package URL template '{template}': {reason}")]
    InvalidUrlTemplate { template: String, reason: String },
}

/// A page or directory under the output directory could not be written.
#[derive(Error, Debug)]
#[error("failed to write {}: {source}", .path.display())]
pub struct OutputWriteFailure {
    /// The file or directory being written.
    pub path: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

impl OutputWriteFailure {
    pub(crate) fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] OutputWriteFailure),

    #[error("none of the {attempted} repositories could be processed")]
    NoRepositoriesProcessable { attempted: usize },
}
