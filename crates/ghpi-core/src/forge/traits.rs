use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ghpi_schema::Digest;

use crate::error::ForgeError;
use crate::repo::Repository;

/// A release published on the forge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub id: u64,
    pub tag_name: String,
    pub draft: bool,
    pub prerelease: bool,
}

/// A downloadable file attached to a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub filename: String,
    pub download_url: String,
    pub size: u64,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub uploader: Option<String>,
    /// Digest as reported by the forge (e.g. `sha256:<hex>`), unvalidated.
    pub digest: Option<String>,
}

/// A remote source that can list releases and their assets (e.g. GitHub).
///
/// Implementations own their retry behaviour: an error returned from any
/// method is final for that request.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Fetch every release of a repository, drafts included.
    async fn list_releases(&self, repo: &Repository) -> Result<Vec<Release>, ForgeError>;

    /// Fetch every asset attached to a release.
    async fn list_assets(
        &self,
        repo: &Repository,
        release: &Release,
    ) -> Result<Vec<Asset>, ForgeError>;

    /// Download an asset and compute its SHA-256.
    async fn sha256(&self, asset: &Asset) -> Result<Digest, ForgeError>;
}
