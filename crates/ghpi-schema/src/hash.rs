use serde::Serialize;
use thiserror::Error;

/// Hash algorithms accepted in index link fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256, the algorithm GitHub reports for release assets.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// Lowercase name as used in `#sha256=...` fragments.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Number of hex characters in a digest of this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha384 => 96,
            Self::Sha512 => 128,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha256" => Some(Self::Sha256),
            "sha384" => Some(Self::Sha384),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from validating a digest string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The `algo:` prefix names an algorithm we do not emit.
    #[error("unsupported digest algorithm '{0}'")]
    UnknownAlgorithm(String),

    /// The digest has no `algo:` (or `algo=`) prefix.
    #[error("digest '{0}' has no algorithm prefix")]
    MissingAlgorithm(String),

    /// Wrong number of hex characters for the algorithm.
    #[error("invalid {algorithm} digest: expected {expected} hex characters, got {actual}")]
    InvalidLength {
        /// Algorithm the digest claims to be.
        algorithm: HashAlgorithm,
        /// Expected hex length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Non-hex characters in the digest.
    #[error("invalid {0} digest: contains non-hex characters")]
    NonHex(HashAlgorithm),
}

/// A validated content digest: algorithm plus lowercase hex.
///
/// Validation happens at construction, so an invalid digest from the forge
/// never reaches a rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: HashAlgorithm,
    hex: String,
}

impl Digest {
    /// Create a digest, validating the hex length and characters.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::InvalidLength`] or [`DigestError::NonHex`].
    pub fn new(algorithm: HashAlgorithm, digest: &str) -> Result<Self, DigestError> {
        if digest.len() != algorithm.hex_len() {
            return Err(DigestError::InvalidLength {
                algorithm,
                expected: algorithm.hex_len(),
                actual: digest.len(),
            });
        }
        if hex::decode(digest).is_err() {
            return Err(DigestError::NonHex(algorithm));
        }
        Ok(Self {
            algorithm,
            hex: digest.to_ascii_lowercase(),
        })
    }

    /// Create a SHA-256 digest from 64 hex characters.
    ///
    /// # Errors
    ///
    /// See [`Digest::new`].
    pub fn sha256(hex: &str) -> Result<Self, DigestError> {
        Self::new(HashAlgorithm::Sha256, hex)
    }

    /// Parse a prefixed digest such as GitHub's `sha256:<hex>` (the
    /// fragment form `sha256=<hex>` is accepted too).
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is missing or unknown, or the hex part
    /// is invalid.
    pub fn parse(s: &str) -> Result<Self, DigestError> {
        let s = s.trim();
        let Some((name, hex)) = s.split_once(':').or_else(|| s.split_once('=')) else {
            return Err(DigestError::MissingAlgorithm(s.to_string()));
        };
        let algorithm = HashAlgorithm::from_name(name)
            .ok_or_else(|| DigestError::UnknownAlgorithm(name.to_string()))?;
        Self::new(algorithm, hex)
    }

    /// The digest algorithm.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// The lowercase hex digest.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// URL fragment body for simple-index links: `sha256=<hex>`.
    pub fn fragment(&self) -> String {
        format!("{}={}", self.algorithm, self.hex)
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}
