//! Distribution filename parsing.
//!
//! Release assets are only indexed when their filename follows one of the
//! packaging naming conventions: built wheels, source distributions or legacy
//! eggs. The original filename is preserved verbatim; the name is normalized
//! into a [`PackageName`] for use as the index key.

use thiserror::Error;

use crate::name::PackageName;
use crate::version::Version;

/// Archive format of a source distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdistFormat {
    /// Gzip-compressed tar archive (`.tar.gz`, `.tgz`).
    TarGz,
    /// Bzip2-compressed tar archive (`.tar.bz2`).
    TarBz2,
    /// XZ-compressed tar archive (`.tar.xz`).
    TarXz,
    /// Uncompressed tar archive (`.tar`).
    Tar,
    /// Zip archive (`.zip`).
    Zip,
}

const SDIST_EXTENSIONS: &[(&str, SdistFormat)] = &[
    (".tar.gz", SdistFormat::TarGz),
    (".tgz", SdistFormat::TarGz),
    (".tar.bz2", SdistFormat::TarBz2),
    (".tar.xz", SdistFormat::TarXz),
    (".tar", SdistFormat::Tar),
    (".zip", SdistFormat::Zip),
];

/// Kind of distributable artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Built wheel (`.whl`).
    Wheel,
    /// Source distribution in the given archive format.
    Sdist(SdistFormat),
    /// Legacy egg (`.egg`).
    Egg,
}

impl FileType {
    /// The `packagetype` label used by package-index JSON metadata.
    pub fn packagetype(self) -> &'static str {
        match self {
            Self::Wheel => "bdist_wheel",
            Self::Sdist(_) => "sdist",
            Self::Egg => "bdist_egg",
        }
    }
}

/// Reasons a filename cannot be indexed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilenameError {
    /// The filename contains characters outside `[A-Za-z0-9_.+-]` or `..`.
    #[error("unsafe package filename: {0}")]
    Unsafe(String),

    /// The extension is not a wheel, egg or source distribution archive.
    #[error("not a recognized distribution: {0}")]
    UnsupportedExtension(String),

    /// The extension is recognized but the stem does not follow its grammar.
    #[error("invalid {kind} filename {filename}: {reason}")]
    Malformed {
        /// The offending filename.
        filename: String,
        /// `wheel`, `sdist` or `egg`.
        kind: &'static str,
        /// What was wrong with it.
        reason: &'static str,
    },
}

/// A filename split into package name, version and file type.
///
/// # Example
///
/// ```
/// use ghpi_schema::{DistFilename, FileType};
///
/// let dist = DistFilename::parse("My_Pkg-1.2.0-py3-none-any.whl").unwrap();
/// assert_eq!(dist.package_name.as_str(), "my-pkg");
/// assert_eq!(dist.version, "1.2.0");
/// assert_eq!(dist.file_type, FileType::Wheel);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistFilename {
    /// The filename exactly as published.
    pub filename: String,
    /// The distribution name as written in the filename.
    pub name: String,
    /// The normalized index key.
    pub package_name: PackageName,
    /// The version string as written in the filename.
    pub version: String,
    /// The artifact kind.
    pub file_type: FileType,
}

impl DistFilename {
    /// Parse a release asset filename.
    ///
    /// # Errors
    ///
    /// Returns [`FilenameError::Unsafe`] for filenames with characters that
    /// have no business in a URL path segment, [`FilenameError::UnsupportedExtension`]
    /// when the file is not a distribution at all, and
    /// [`FilenameError::Malformed`] when the stem cannot be split into a
    /// name and a version.
    pub fn parse(filename: &str) -> Result<Self, FilenameError> {
        if !is_safe(filename) {
            return Err(FilenameError::Unsafe(filename.to_string()));
        }

        // Safe filenames are ASCII, so byte offsets from the lowercased copy
        // are valid in `filename`.
        let lower = filename.to_ascii_lowercase();

        let (name, version, file_type) = if lower.ends_with(".whl") {
            let stem = &filename[..filename.len() - ".whl".len()];
            let (name, version) = split_wheel(filename, stem)?;
            (name, version, FileType::Wheel)
        } else if lower.ends_with(".egg") {
            let stem = &filename[..filename.len() - ".egg".len()];
            let (name, version) = split_egg(filename, stem)?;
            (name, version, FileType::Egg)
        } else if let Some((ext, format)) = SDIST_EXTENSIONS
            .iter()
            .find(|(ext, _)| lower.ends_with(ext))
        {
            let stem = &filename[..filename.len() - ext.len()];
            let (name, version) = split_sdist(filename, stem)?;
            (name, version, FileType::Sdist(*format))
        } else {
            return Err(FilenameError::UnsupportedExtension(filename.to_string()));
        };

        Ok(Self {
            filename: filename.to_string(),
            package_name: PackageName::new(&name),
            name,
            version,
            file_type,
        })
    }

    /// Parse the version string into a comparable [`Version`].
    pub fn parsed_version(&self) -> Version {
        Version::parse(&self.version)
    }
}

fn is_safe(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains("..")
        && filename
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'+'))
}

fn starts_with_digit(s: &str) -> bool {
    s.bytes().next().is_some_and(|b| b.is_ascii_digit())
}

fn malformed(filename: &str, kind: &'static str, reason: &'static str) -> FilenameError {
    FilenameError::Malformed {
        filename: filename.to_string(),
        kind,
        reason,
    }
}

/// `{name}-{version}(-{build})?-{python}-{abi}-{platform}`
fn split_wheel(filename: &str, stem: &str) -> Result<(String, String), FilenameError> {
    let parts: Vec<&str> = stem.split('-').collect();
    let (name, version, build) = match parts.as_slice() {
        [name, version, _, _, _] => (*name, *version, None),
        [name, version, build, _, _, _] => (*name, *version, Some(*build)),
        _ => {
            return Err(malformed(
                filename,
                "wheel",
                "expected 5 or 6 dash-separated fields",
            ));
        }
    };

    if parts.iter().any(|p| p.is_empty()) {
        return Err(malformed(filename, "wheel", "empty field"));
    }
    if !starts_with_digit(version) {
        return Err(malformed(filename, "wheel", "version must start with a digit"));
    }
    if build.is_some_and(|b| !starts_with_digit(b)) {
        return Err(malformed(filename, "wheel", "build tag must start with a digit"));
    }

    Ok((name.to_string(), version.to_string()))
}

/// `{name}-{version}(-py{X.Y}(-{platform})?)?`; the platform may itself
/// contain dashes (`linux-x86_64`).
fn split_egg(filename: &str, stem: &str) -> Result<(String, String), FilenameError> {
    let parts: Vec<&str> = stem.split('-').collect();
    let [name, version, rest @ ..] = parts.as_slice() else {
        return Err(malformed(filename, "egg", "missing version"));
    };

    if name.is_empty() || version.is_empty() {
        return Err(malformed(filename, "egg", "empty name or version"));
    }
    if rest.first().is_some_and(|py| !py.starts_with("py")) {
        return Err(malformed(filename, "egg", "python tag must start with 'py'"));
    }

    Ok((name.to_string(), version.to_string()))
}

/// Source distributions have no strict grammar. With a single dash the stem
/// splits there; otherwise the version starts at the leftmost field (never
/// the first) that holds both a dot and a digit, e.g. `my-tool-2.0-rc1`.
fn split_sdist(filename: &str, stem: &str) -> Result<(String, String), FilenameError> {
    let parts: Vec<&str> = stem.split('-').collect();

    let split_at = match parts.len() {
        1 => return Err(malformed(filename, "sdist", "missing version")),
        2 => Some(1),
        _ => (1..parts.len()).find(|&i| {
            let part = parts[i];
            part.contains('.') && part.bytes().any(|b| b.is_ascii_digit())
        }),
    };
    let Some(split_at) = split_at else {
        return Err(malformed(filename, "sdist", "no field looks like a version"));
    };

    let name = parts[..split_at].join("-");
    let version = parts[split_at..].join("-");
    if name.is_empty() {
        return Err(malformed(filename, "sdist", "empty name"));
    }
    if version.is_empty() {
        return Err(malformed(filename, "sdist", "empty version"));
    }

    Ok((name, version))
}
