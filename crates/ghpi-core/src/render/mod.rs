//! Static simple-index rendering.
//!
//! Output layout:
//!
//! ```text
//! <output>/index.html            root listing of every package
//! <output>/<name>/index.html     download links for one package
//! <output>/pypi/<name>/json      JSON metadata for one package
//! ```

mod html;
mod json;
mod template;

use std::path::PathBuf;

use ghpi_schema::PackageFile;

pub use template::UrlTemplate;

use crate::error::OutputWriteFailure;
use crate::index::PackageIndex;
use crate::io::{WriteOutcome, write_atomic};

/// Settings for one render pass.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub title: String,
    pub output_dir: PathBuf,
    /// Overrides each file's forge download URL when set.
    pub package_url_template: Option<UrlTemplate>,
}

impl RenderConfig {
    pub fn new(title: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            output_dir: output_dir.into(),
            package_url_template: None,
        }
    }

    pub fn with_package_url_template(mut self, template: Option<UrlTemplate>) -> Self {
        self.package_url_template = template;
        self
    }

    /// Where installers download `file` from.
    pub(crate) fn file_url(&self, file: &PackageFile) -> String {
        match &self.package_url_template {
            Some(template) => template.expand(file),
            None => file.url.clone(),
        }
    }
}

/// Counts from one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub packages: usize,
    pub files: usize,
    /// Pages created or replaced.
    pub pages_written: usize,
    /// Pages whose bytes already matched on disk.
    pub pages_unchanged: usize,
}

impl RenderSummary {
    fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Written => self.pages_written += 1,
            WriteOutcome::Unchanged => self.pages_unchanged += 1,
        }
    }
}

/// Render `index` under `config.output_dir`.
///
/// Package pages are written before the root page, so the root never links
/// to a page that does not exist yet. Directories of packages no longer in
/// the index are left in place.
///
/// # Errors
///
/// Returns [`OutputWriteFailure`] for the first page that cannot be written.
pub fn render(index: &PackageIndex, config: &RenderConfig) -> Result<RenderSummary, OutputWriteFailure> {
    let mut summary = RenderSummary {
        packages: index.package_count(),
        files: index.file_count(),
        ..RenderSummary::default()
    };

    for (name, files) in index.packages() {
        tracing::info!("rendering {name} ({} files)", files.len());
        let dir = config.output_dir.join(name.as_str());

        let page = html::package_page(name, files, config);
        summary.record(write_atomic(&dir.join("index.html"), page.as_bytes())?);

        let path = config.output_dir.join("pypi").join(name.as_str()).join("json");
        let metadata = json::package_metadata(name, files, config)
            .map_err(|e| OutputWriteFailure::new(&path, std::io::Error::other(e)))?;
        summary.record(write_atomic(&path, &metadata)?);
    }

    let root = html::root_page(index, config);
    summary.record(write_atomic(&config.output_dir.join("index.html"), root.as_bytes())?);

    tracing::info!(
        "rendered {} packages: {} pages written, {} unchanged",
        summary.packages,
        summary.pages_written,
        summary.pages_unchanged
    );
    Ok(summary)
}
