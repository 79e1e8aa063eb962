//! Per-package JSON metadata in the shape of the package-index JSON API.
//!
//! Only fields known from the forge are emitted.

use std::collections::BTreeMap;

use ghpi_schema::{PackageFile, PackageName, Version};
use serde::Serialize;

use super::RenderConfig;
use crate::index::latest_file;

#[derive(Debug, Serialize)]
struct PackageMetadata<'a> {
    info: Info<'a>,
    releases: BTreeMap<String, Vec<FileEntry<'a>>>,
    urls: Vec<FileEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct Info<'a> {
    name: &'a str,
    version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct FileEntry<'a> {
    filename: &'a str,
    url: String,
    packagetype: &'static str,
    size: u64,
    digests: BTreeMap<&'static str, &'a str>,
    upload_time_iso_8601: Option<String>,
    uploaded_by: Option<&'a str>,
}

impl<'a> FileEntry<'a> {
    fn new(file: &'a PackageFile, config: &RenderConfig) -> Self {
        let digests = file
            .hash
            .iter()
            .map(|digest| (digest.algorithm().as_str(), digest.hex()))
            .collect();
        Self {
            filename: &file.filename,
            url: config.file_url(file),
            packagetype: file.file_type.packagetype(),
            size: file.size,
            digests,
            upload_time_iso_8601: file
                .uploaded_at
                .map(|t| t.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)),
            uploaded_by: file.uploaded_by.as_deref(),
        }
    }
}

pub(super) fn package_metadata(
    name: &PackageName,
    files: &[PackageFile],
    config: &RenderConfig,
) -> serde_json::Result<Vec<u8>> {
    let latest = latest_file(files).map(|f| &f.version);

    // Files are sorted by version, so equal versions are adjacent. Each group
    // is keyed by the spelling of its first version.
    let mut releases: BTreeMap<String, Vec<FileEntry<'_>>> = BTreeMap::new();
    let mut group: Option<(&Version, String)> = None;
    let mut latest_key = None;
    for file in files {
        let key = match &group {
            Some((version, key)) if **version == file.version => key.clone(),
            _ => {
                let key = file.version.to_string();
                group = Some((&file.version, key.clone()));
                key
            }
        };
        if latest == Some(&file.version) {
            latest_key = Some(key.clone());
        }
        releases.entry(key).or_default().push(FileEntry::new(file, config));
    }
    let urls = latest_key
        .as_ref()
        .and_then(|key| releases.get(key))
        .cloned()
        .unwrap_or_default();

    let metadata = PackageMetadata {
        info: Info {
            name: name.as_str(),
            version: latest_key,
        },
        releases,
        urls,
    };
    let mut bytes = serde_json::to_vec_pretty(&metadata)?;
    bytes.push(b'\n');
    Ok(bytes)
}
