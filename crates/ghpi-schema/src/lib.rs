//! Shared types for the ghpi package index.
//!
//! Everything here is pure data: normalized package names, comparable
//! versions, distribution filename parsing and content digests. Network and
//! filesystem concerns live in `ghpi-core`.

pub mod filename;
/// Validated content digests.
pub mod hash;
/// Normalized package names.
pub mod name;
pub mod package;
pub mod version;

// Re-exports
pub use filename::{DistFilename, FileType, FilenameError, SdistFormat};
pub use hash::{Digest, DigestError, HashAlgorithm};
pub use name::PackageName;
pub use package::{AssetOrigin, PackageFile};
pub use version::{LocalSegment, ParsedVersion, PreRelease, Version};
