use std::path::Path;

use crate::error::ConfigError;

/// A validated forge repository reference in `owner/repo` format.
///
/// # Example
///
/// ```
/// use ghpi_core::repo::Repository;
///
/// let repo = Repository::parse("pallets/flask").unwrap();
/// assert_eq!(repo.owner(), "pallets");
/// assert_eq!(repo.name(), "flask");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Repository {
    owner: String,
    name: String,
}

impl Repository {
    /// Parse `owner/repo`, also accepting `https://github.com/owner/repo(.git)`.
    ///
    /// # Errors
    ///
    /// Returns an error string if `s` is not in `owner/repo` format or either
    /// component is empty or contains characters outside `[A-Za-z0-9._-]`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        let path = trimmed
            .strip_prefix("https://github.com/")
            .or_else(|| trimmed.strip_prefix("http://github.com/"))
            .map_or(trimmed, |p| {
                let p = p.trim_end_matches('/');
                p.strip_suffix(".git").unwrap_or(p)
            });

        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        };

        match path.split_once('/') {
            Some((owner, name)) if valid(owner) && valid(name) => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(format!("expected 'owner/repo', got '{trimmed}'")),
        }
    }

    /// Create a repository from already-validated parts.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Get the owner part.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Get the repo name part.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Parse a newline-delimited repository list.
///
/// Blank lines and `#` comments (whole-line or trailing after whitespace) are
/// ignored; repeated entries keep their first position.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidRepository`] with the 1-based line number of
/// the first invalid entry.
pub fn parse_repositories(text: &str) -> Result<Vec<Repository>, ConfigError> {
    let mut repositories: Vec<Repository> = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.split_once(" #").map_or(raw, |(entry, _)| entry).trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let repo = Repository::parse(line).map_err(|reason| ConfigError::InvalidRepository {
            line: index + 1,
            reason,
        })?;
        if repositories.contains(&repo) {
            tracing::debug!("ignoring duplicate repository {repo} on line {}", index + 1);
            continue;
        }
        tracing::info!("found repository: {repo}");
        repositories.push(repo);
    }
    Ok(repositories)
}

/// Read and parse the repository list at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::ReadRepositories`] if the file cannot be read, or
/// any error from [`parse_repositories`].
pub fn load_repositories(path: &Path) -> Result<Vec<Repository>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadRepositories {
        path: path.to_path_buf(),
        source,
    })?;
    parse_repositories(&text)
}
