//! Release collection: forge releases in, candidate package files out.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use ghpi_schema::{AssetOrigin, Digest, DistFilename, PackageFile};

use crate::error::{CollectWarning, ForgeError};
use crate::forge::{Asset, Forge, Release};
use crate::repo::Repository;

/// Repositories fetched concurrently unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Everything gathered from one pass over the repository list.
#[derive(Debug, Default)]
pub struct Collection {
    /// Indexable files, in repository list order.
    pub files: Vec<PackageFile>,
    pub warnings: Vec<CollectWarning>,
    pub repositories_indexed: usize,
    pub repositories_failed: usize,
}

impl Collection {
    /// Assets dropped because their filename is not a distribution.
    pub fn assets_skipped(&self) -> usize {
        self.warnings.iter().filter(|w| w.skipped_asset()).count()
    }
}

#[derive(Default)]
struct Harvest {
    files: Vec<PackageFile>,
    warnings: Vec<CollectWarning>,
}

impl Harvest {
    fn warn(&mut self, warning: CollectWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Walks every non-draft release of each repository and turns its assets
/// into [`PackageFile`]s.
pub struct ReleaseCollector {
    forge: Arc<dyn Forge>,
    concurrency: usize,
    compute_missing_hashes: bool,
}

impl std::fmt::Debug for ReleaseCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseCollector")
            .field("concurrency", &self.concurrency)
            .field("compute_missing_hashes", &self.compute_missing_hashes)
            .finish_non_exhaustive()
    }
}

impl ReleaseCollector {
    pub fn new(forge: Arc<dyn Forge>) -> Self {
        Self {
            forge,
            concurrency: DEFAULT_CONCURRENCY,
            compute_missing_hashes: false,
        }
    }

    /// Limit the number of repositories in flight (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Download and hash assets the forge reports no digest for.
    pub fn with_computed_hashes(mut self, enabled: bool) -> Self {
        self.compute_missing_hashes = enabled;
        self
    }

    /// Collect every repository. Never fails: unreachable repositories and
    /// unusable assets become warnings.
    ///
    /// Results are merged in input order regardless of completion order.
    pub async fn collect(&self, repositories: &[Repository]) -> Collection {
        let results: Vec<Result<Harvest, CollectWarning>> = stream::iter(repositories)
            .map(|repo| self.collect_repository(repo))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut collection = Collection::default();
        for result in results {
            match result {
                Ok(harvest) => {
                    collection.repositories_indexed += 1;
                    collection.files.extend(harvest.files);
                    collection.warnings.extend(harvest.warnings);
                }
                Err(warning) => {
                    collection.repositories_failed += 1;
                    collection.warnings.push(warning);
                }
            }
        }
        collection
    }

    async fn collect_repository(&self, repo: &Repository) -> Result<Harvest, CollectWarning> {
        tracing::info!("fetching releases for {repo}");
        let releases = self
            .forge
            .list_releases(repo)
            .await
            .map_err(|e| unavailable(repo, &e))?;

        let mut harvest = Harvest::default();
        for release in &releases {
            if release.draft {
                tracing::debug!("{repo}: skipping draft release {}", release.tag_name);
                continue;
            }
            let assets = self
                .forge
                .list_assets(repo, release)
                .await
                .map_err(|e| unavailable(repo, &e))?;
            for asset in assets {
                if let Some(file) = self.package_file(repo, release, asset, &mut harvest).await {
                    harvest.files.push(file);
                }
            }
        }

        tracing::info!(
            "{repo}: {} package files from {} releases",
            harvest.files.len(),
            releases.len()
        );
        Ok(harvest)
    }

    async fn package_file(
        &self,
        repo: &Repository,
        release: &Release,
        asset: Asset,
        harvest: &mut Harvest,
    ) -> Option<PackageFile> {
        let dist = match DistFilename::parse(&asset.filename) {
            Ok(dist) => dist,
            Err(error) => {
                harvest.warn(CollectWarning::UnparsableFilename {
                    repository: repo.to_string(),
                    error,
                });
                return None;
            }
        };

        let mut hash = match asset.digest.as_deref().map(Digest::parse).transpose() {
            Ok(hash) => hash,
            Err(error) => {
                harvest.warn(CollectWarning::InvalidDigest {
                    repository: repo.to_string(),
                    filename: asset.filename.clone(),
                    error,
                });
                None
            }
        };

        if hash.is_none() && self.compute_missing_hashes {
            match self.forge.sha256(&asset).await {
                Ok(digest) => hash = Some(digest),
                Err(e) => harvest.warn(CollectWarning::HashFailed {
                    repository: repo.to_string(),
                    filename: asset.filename.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        let origin = AssetOrigin::new(repo.owner(), repo.name(), &release.tag_name);
        Some(
            PackageFile::new(dist, asset.download_url, origin)
                .with_size(asset.size)
                .with_upload(asset.uploaded_at, asset.uploader)
                .with_hash(hash),
        )
    }
}

fn unavailable(repo: &Repository, err: &ForgeError) -> CollectWarning {
    let warning = CollectWarning::RepositoryUnavailable {
        repository: repo.to_string(),
        reason: err.to_string(),
    };
    tracing::warn!("{warning}");
    warning
}
