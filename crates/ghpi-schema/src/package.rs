//! The index record for one release asset.

use chrono::{DateTime, Utc};

use crate::filename::{DistFilename, FileType};
use crate::hash::Digest;
use crate::name::PackageName;
use crate::version::Version;

/// Where an asset was published on the forge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetOrigin {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Tag of the release the asset is attached to.
    pub tag: String,
}

impl AssetOrigin {
    /// Create an origin from its parts.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            tag: tag.into(),
        }
    }
}

/// One distributable artifact as listed in the index.
///
/// `filename` is the identity of a record: the index holds at most one
/// `PackageFile` per filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    /// Literal artifact filename, used verbatim as link text.
    pub filename: String,
    /// Normalized package name (index key).
    pub package_name: PackageName,
    /// Comparable version.
    pub version: Version,
    /// Wheel, sdist or egg.
    pub file_type: FileType,
    /// Absolute download URL on the forge.
    pub url: String,
    /// Size in bytes as reported by the forge.
    pub size: u64,
    /// When the asset was uploaded, if known.
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Login of the uploader, if known.
    pub uploaded_by: Option<String>,
    /// Content digest, if the forge reported one or it was computed.
    pub hash: Option<Digest>,
    /// Repository and release the asset came from.
    pub origin: AssetOrigin,
}

impl PackageFile {
    /// Build a record from a parsed filename and its download location.
    pub fn new(dist: DistFilename, url: impl Into<String>, origin: AssetOrigin) -> Self {
        let version = dist.parsed_version();
        Self {
            filename: dist.filename,
            package_name: dist.package_name,
            version,
            file_type: dist.file_type,
            url: url.into(),
            size: 0,
            uploaded_at: None,
            uploaded_by: None,
            hash: None,
            origin,
        }
    }

    /// Set the size in bytes.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Set upload time and uploader.
    pub fn with_upload(mut self, at: Option<DateTime<Utc>>, by: Option<String>) -> Self {
        self.uploaded_at = at;
        self.uploaded_by = by;
        self
    }

    /// Set the content digest.
    pub fn with_hash(mut self, hash: Option<Digest>) -> Self {
        self.hash = hash;
        self
    }

    /// Ordering within a package: version, then filename.
    pub fn sort_key(&self) -> (&Version, &str) {
        (&self.version, &self.filename)
    }
}
