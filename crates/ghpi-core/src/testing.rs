//! In-memory forge for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ghpi_schema::Digest;
use reqwest::StatusCode;

use crate::error::ForgeError;
use crate::forge::{Asset, Forge, Release};
use crate::repo::Repository;

#[derive(Debug, Default)]
pub(crate) struct MemoryForge {
    releases: HashMap<String, Vec<(Release, Vec<Asset>)>>,
    failing: HashSet<String>,
    hashes: HashMap<String, Digest>,
    pub(crate) hash_requests: AtomicUsize,
}

impl MemoryForge {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(mut self, repo: &str, tag: &str, draft: bool, assets: Vec<Asset>) -> Self {
        let releases = self.releases.entry(repo.to_string()).or_default();
        let release = Release {
            id: releases.len() as u64 + 1,
            tag_name: tag.to_string(),
            draft,
            prerelease: false,
        };
        releases.push((release, assets));
        self
    }

    pub(crate) fn with_release(self, repo: &str, tag: &str, assets: Vec<Asset>) -> Self {
        self.push(repo, tag, false, assets)
    }

    pub(crate) fn with_draft(self, repo: &str, tag: &str, assets: Vec<Asset>) -> Self {
        self.push(repo, tag, true, assets)
    }

    /// Every request for `repo` fails with a 503.
    pub(crate) fn with_failing(mut self, repo: &str) -> Self {
        self.failing.insert(repo.to_string());
        self
    }

    pub(crate) fn with_download_hash(mut self, url: &str, digest: Digest) -> Self {
        self.hashes.insert(url.to_string(), digest);
        self
    }

    fn check(&self, repo: &Repository) -> Result<(), ForgeError> {
        if self.failing.contains(&repo.to_string()) {
            return Err(ForgeError::Status {
                url: format!("memory://{repo}"),
                status: StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(())
    }
}

/// An asset with no digest, hosted under a fake release URL.
pub(crate) fn asset(filename: &str) -> Asset {
    Asset {
        filename: filename.to_string(),
        download_url: format!("https://github.com/o/r/releases/download/v/{filename}"),
        size: 10,
        uploaded_at: None,
        uploader: None,
        digest: None,
    }
}

#[async_trait]
impl Forge for MemoryForge {
    async fn list_releases(&self, repo: &Repository) -> Result<Vec<Release>, ForgeError> {
        self.check(repo)?;
        let releases = self
            .releases
            .get(&repo.to_string())
            .ok_or_else(|| ForgeError::Status {
                url: format!("memory://{repo}"),
                status: StatusCode::NOT_FOUND,
            })?;
        Ok(releases.iter().map(|(release, _)| release.clone()).collect())
    }

    async fn list_assets(
        &self,
        repo: &Repository,
        release: &Release,
    ) -> Result<Vec<Asset>, ForgeError> {
        self.check(repo)?;
        Ok(self
            .releases
            .get(&repo.to_string())
            .and_then(|releases| releases.iter().find(|(r, _)| r.id == release.id))
            .map(|(_, assets)| assets.clone())
            .unwrap_or_default())
    }

    async fn sha256(&self, asset: &Asset) -> Result<Digest, ForgeError> {
        self.hash_requests.fetch_add(1, Ordering::SeqCst);
        self.hashes
            .get(&asset.download_url)
            .cloned()
            .ok_or_else(|| ForgeError::Status {
                url: asset.download_url.clone(),
                status: StatusCode::NOT_FOUND,
            })
    }
}
