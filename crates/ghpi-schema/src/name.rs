use serde::Serialize;

/// A normalized package name, the key of the index.
///
/// Normalization lowercases the name and collapses every run of `-`, `_` and
/// `.` into a single `-`, so `Foo_Bar`, `foo.bar` and `FOO--bar` are all
/// `foo-bar`.
///
/// # Example
///
/// ```
/// use ghpi_schema::PackageName;
///
/// assert_eq!(PackageName::new("Zope.Interface").as_str(), "zope-interface");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    /// Normalize a raw distribution name.
    pub fn new(raw: &str) -> Self {
        let mut normalized = String::with_capacity(raw.len());
        let mut in_separator = false;
        for c in raw.chars() {
            if matches!(c, '-' | '_' | '.') {
                if !in_separator {
                    normalized.push('-');
                }
                in_separator = true;
            } else {
                in_separator = false;
                normalized.extend(c.to_lowercase());
            }
        }
        Self(normalized)
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
