//! In-memory package index.

use std::collections::{BTreeMap, HashMap};

use ghpi_schema::{PackageFile, PackageName};

/// Accumulates [`PackageFile`]s, keeping one record per filename.
///
/// A later record with an already seen filename replaces the earlier one,
/// even when the two normalize to different package names.
#[derive(Debug, Default)]
pub struct PackageIndexBuilder {
    packages: HashMap<PackageName, HashMap<String, PackageFile>>,
    owners: HashMap<String, PackageName>,
}

impl PackageIndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, returning the record it replaced.
    pub fn add(&mut self, file: PackageFile) -> Option<PackageFile> {
        let previous_owner = self
            .owners
            .insert(file.filename.clone(), file.package_name.clone());

        let mut replaced = None;
        if let Some(owner) = previous_owner.filter(|owner| *owner != file.package_name) {
            if let Some(files) = self.packages.get_mut(&owner) {
                replaced = files.remove(&file.filename);
                if files.is_empty() {
                    self.packages.remove(&owner);
                }
            }
        }

        let key = file.package_name.clone();
        let filename = file.filename.clone();
        let displaced = self.packages.entry(key).or_default().insert(filename, file);
        if let Some(old) = &displaced {
            tracing::debug!("{} replaces an earlier asset of the same name", old.filename);
        }
        replaced.or(displaced)
    }

    /// Sort every package's files by (version, filename) and freeze.
    pub fn finalize(self) -> PackageIndex {
        let packages = self
            .packages
            .into_iter()
            .map(|(name, files)| {
                let mut files: Vec<PackageFile> = files.into_values().collect();
                files.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
                (name, files)
            })
            .collect();
        PackageIndex { packages }
    }
}

impl Extend<PackageFile> for PackageIndexBuilder {
    fn extend<T: IntoIterator<Item = PackageFile>>(&mut self, iter: T) {
        for file in iter {
            self.add(file);
        }
    }
}

/// Normalized package name to its files, ascending by version.
///
/// Packages iterate in name order and no package is ever empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageIndex {
    packages: BTreeMap<PackageName, Vec<PackageFile>>,
}

impl PackageIndex {
    pub fn builder() -> PackageIndexBuilder {
        PackageIndexBuilder::new()
    }

    /// Packages in name order with their sorted files.
    pub fn packages(&self) -> impl Iterator<Item = (&PackageName, &[PackageFile])> {
        self.packages
            .iter()
            .map(|(name, files)| (name, files.as_slice()))
    }

    pub fn get(&self, name: &PackageName) -> Option<&[PackageFile]> {
        self.packages.get(name).map(Vec::as_slice)
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }

    pub fn file_count(&self) -> usize {
        self.packages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl FromIterator<PackageFile> for PackageIndex {
    fn from_iter<T: IntoIterator<Item = PackageFile>>(iter: T) -> Self {
        let mut builder = PackageIndexBuilder::new();
        builder.extend(iter);
        builder.finalize()
    }
}

/// The file whose version counts as "latest" for a package: the newest
/// final release, or the newest file if every version is a pre-release.
///
/// `files` must be sorted as in [`PackageIndex`].
pub fn latest_file(files: &[PackageFile]) -> Option<&PackageFile> {
    files
        .iter()
        .rev()
        .find(|f| f.version.is_parsed() && !f.version.is_prerelease())
        .or_else(|| files.last())
}
