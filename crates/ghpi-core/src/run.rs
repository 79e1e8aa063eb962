//! One end-to-end indexing run.

use std::fmt;

use crate::collector::ReleaseCollector;
use crate::error::{CollectWarning, RunError};
use crate::index::PackageIndex;
use crate::io::ensure_dir;
use crate::render::{RenderConfig, RenderSummary, render};
use crate::repo::Repository;

/// Outcome of a successful run.
#[derive(Debug)]
pub struct RunSummary {
    pub repositories: usize,
    pub repositories_indexed: usize,
    pub repositories_failed: usize,
    pub assets_skipped: usize,
    pub packages: usize,
    pub files: usize,
    pub warnings: Vec<CollectWarning>,
    pub render: RenderSummary,
}

impl RunSummary {
    /// True when the repository list was empty.
    pub fn nothing_to_index(&self) -> bool {
        self.repositories == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "indexed {} packages ({} files) from {} repositories; skipped {} assets, {} repositories",
            self.packages,
            self.files,
            self.repositories_indexed,
            self.assets_skipped,
            self.repositories_failed
        )
    }
}

/// Collect `repositories`, build the index and render it.
///
/// # Errors
///
/// - [`RunError::Output`] if the output directory or a page cannot be written.
///   The directory is checked before any forge request.
/// - [`RunError::NoRepositoriesProcessable`] if every repository failed. No
///   page is written in that case, so a previous index stays intact.
pub async fn run(
    collector: &ReleaseCollector,
    repositories: &[Repository],
    config: &RenderConfig,
) -> Result<RunSummary, RunError> {
    ensure_dir(&config.output_dir)?;

    if repositories.is_empty() {
        tracing::warn!("repository list is empty, nothing to index");
    }

    let collection = collector.collect(repositories).await;
    if !repositories.is_empty() && collection.repositories_indexed == 0 {
        return Err(RunError::NoRepositoriesProcessable {
            attempted: repositories.len(),
        });
    }

    let assets_skipped = collection.assets_skipped();
    let index: PackageIndex = collection.files.into_iter().collect();
    tracing::info!(
        "built index: {} packages, {} files",
        index.package_count(),
        index.file_count()
    );
    let rendered = render(&index, config)?;

    Ok(RunSummary {
        repositories: repositories.len(),
        repositories_indexed: collection.repositories_indexed,
        repositories_failed: collection.repositories_failed,
        assets_skipped,
        packages: index.package_count(),
        files: index.file_count(),
        warnings: collection.warnings,
        render: rendered,
    })
}
