//! Comparable package versions.
//!
//! Versions follow the packaging version-specifier grammar: an optional epoch,
//! a dotted release segment, then optional pre, post and dev releases and a
//! local label. Strings outside that grammar are kept verbatim as
//! [`Version::Unparsed`]; they compare lexically among themselves and sort
//! before every parsed version, so malformed releases stay visible in the
//! index without ever being picked as the newest.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

const VERSION_PATTERN: &str = r"(?ix)
    ^\s*
    v?
    (?:(?P<epoch>[0-9]+)!)?
    (?P<release>[0-9]+(?:\.[0-9]+)*)
    (?P<pre>
        [-_.]?
        (?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)
        [-_.]?
        (?P<pre_n>[0-9]+)?
    )?
    (?P<post>
        (?:-(?P<post_n1>[0-9]+))
        |
        (?:
            [-_.]?
            (?P<post_l>post|rev|r)
            [-_.]?
            (?P<post_n2>[0-9]+)?
        )
    )?
    (?P<dev>
        [-_.]?
        (?P<dev_l>dev)
        [-_.]?
        (?P<dev_n>[0-9]+)?
    )?
    (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
    \s*$
";

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(VERSION_PATTERN).expect("version pattern is a valid regex"));

/// Pre-release phase, ordered `a < b < rc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    /// `a`, `alpha`
    Alpha,
    /// `b`, `beta`
    Beta,
    /// `rc`, `c`, `pre`, `preview`
    Rc,
}

impl PreRelease {
    fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Some(Self::Alpha),
            "b" | "beta" => Some(Self::Beta),
            "rc" | "c" | "pre" | "preview" => Some(Self::Rc),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::Rc => "rc",
        }
    }
}

/// One dot-separated segment of a local version label (`+ubuntu.1`).
///
/// Alphanumeric segments sort before numeric ones; variant order encodes that.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalSegment {
    /// A segment containing letters, stored lowercase.
    Alpha(String),
    /// A purely numeric segment.
    Numeric(u64),
}

impl LocalSegment {
    fn parse(segment: &str) -> Option<Self> {
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            segment.parse().ok().map(Self::Numeric)
        } else {
            Some(Self::Alpha(segment.to_ascii_lowercase()))
        }
    }
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alpha(s) => write!(f, "{s}"),
            Self::Numeric(n) => write!(f, "{n}"),
        }
    }
}

// Ordering helpers. Variant order is the sort order.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    DevOnly,
    Pre(PreRelease, u64),
    Final,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
    Dev(u64),
    Final,
}

/// A version that matched the version-specifier grammar.
#[derive(Debug, Clone)]
pub struct ParsedVersion {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreRelease, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

impl ParsedVersion {
    /// Parse a version string, returning `None` if it does not match the
    /// grammar or a number does not fit in a `u64`.
    pub fn parse(s: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(s)?;

        let epoch = match caps.name("epoch") {
            Some(m) => parse_number(m.as_str())?,
            None => 0,
        };

        let release = caps
            .name("release")?
            .as_str()
            .split('.')
            .map(parse_number)
            .collect::<Option<Vec<_>>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => {
                let phase = PreRelease::from_label(label.as_str())?;
                Some((phase, optional_number(caps.name("pre_n"))?))
            }
            None => None,
        };

        let post = if let Some(m) = caps.name("post_n1") {
            Some(parse_number(m.as_str())?)
        } else if caps.name("post_l").is_some() {
            Some(optional_number(caps.name("post_n2"))?)
        } else {
            None
        };

        let dev = if caps.name("dev_l").is_some() {
            Some(optional_number(caps.name("dev_n"))?)
        } else {
            None
        };

        let local = match caps.name("local") {
            Some(m) => m
                .as_str()
                .split(['-', '_', '.'])
                .map(LocalSegment::parse)
                .collect::<Option<Vec<_>>>()?,
            None => Vec::new(),
        };

        Some(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    /// The epoch (`N!` prefix), zero when absent.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The release segment as written (trailing zeros kept).
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    /// Pre-release phase and number.
    pub fn pre(&self) -> Option<(PreRelease, u64)> {
        self.pre
    }

    /// Post-release number.
    pub fn post(&self) -> Option<u64> {
        self.post
    }

    /// Dev-release number.
    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    /// Local label segments, empty when there is no label.
    pub fn local(&self) -> &[LocalSegment] {
        &self.local
    }

    /// True for pre-releases and dev releases.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    fn sort_key(&self) -> (u64, &[u64], PreKey, Option<u64>, DevKey, &[LocalSegment]) {
        let mut release = self.release.as_slice();
        while let [rest @ .., 0] = release {
            release = rest;
        }

        let pre = match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PreKey::DevOnly,
            (None, _, _) => PreKey::Final,
            (Some((phase, n)), _, _) => PreKey::Pre(phase, n),
        };
        let dev = self.dev.map_or(DevKey::Final, DevKey::Dev);

        (self.epoch, release, pre, self.post, dev, self.local.as_slice())
    }
}

fn parse_number(digits: &str) -> Option<u64> {
    digits.parse().ok()
}

/// A missing number defaults to zero (`1.0a` is `1.0a0`).
fn optional_number(m: Option<regex::Match<'_>>) -> Option<u64> {
    m.map_or(Some(0), |m| parse_number(m.as_str()))
}

impl Ord for ParsedVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ParsedVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ParsedVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ParsedVersion {}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((phase, n)) = self.pre {
            write!(f, "{}{n}", phase.as_str())?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{n}")?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{n}")?;
        }
        if !self.local.is_empty() {
            let local: Vec<String> = self.local.iter().map(ToString::to_string).collect();
            write!(f, "+{}", local.join("."))?;
        }
        Ok(())
    }
}

/// A package version: either parsed per the grammar, or kept verbatim.
#[derive(Debug, Clone)]
pub enum Version {
    /// A version matching the version-specifier grammar.
    Parsed(ParsedVersion),
    /// Anything else, compared lexically.
    Unparsed(String),
}

impl Version {
    /// Parse a version string. Never fails: unparsable input becomes
    /// [`Version::Unparsed`].
    pub fn parse(s: &str) -> Self {
        ParsedVersion::parse(s).map_or_else(|| Self::Unparsed(s.to_string()), Self::Parsed)
    }

    /// True if the string matched the grammar.
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    /// True for parsed pre-releases and dev releases.
    pub fn is_prerelease(&self) -> bool {
        matches!(self, Self::Parsed(v) if v.is_prerelease())
    }

    /// The structured version, if parsing succeeded.
    pub fn as_parsed(&self) -> Option<&ParsedVersion> {
        match self {
            Self::Parsed(v) => Some(v),
            Self::Unparsed(_) => None,
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Parsed(a), Self::Parsed(b)) => a.cmp(b),
            (Self::Unparsed(a), Self::Unparsed(b)) => a.cmp(b),
            (Self::Unparsed(_), Self::Parsed(_)) => Ordering::Less,
            (Self::Parsed(_), Self::Unparsed(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed(v) => write!(f, "{v}"),
            Self::Unparsed(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s)
    }

    fn assert_ascending(versions: &[&str]) {
        for pair in versions.windows(2) {
            assert!(
                v(pair[0]) < v(pair[1]),
                "expected {} < {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_pre_final_post_order() {
        let mut versions: Vec<Version> = ["1.0", "1.0a1", "1.0.post1"].map(v).to_vec();
        versions.sort();
        let rendered: Vec<String> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["1.0a1", "1.0", "1.0.post1"]);
    }

    #[test]
    fn test_full_ordering_chain() {
        assert_ascending(&[
            "1.0.dev456",
            "1.0a1",
            "1.0a2.dev456",
            "1.0a12.dev456",
            "1.0a12",
            "1.0b1.dev456",
            "1.0b2",
            "1.0b2.post345.dev456",
            "1.0b2.post345",
            "1.0rc1.dev456",
            "1.0rc1",
            "1.0",
            "1.0+abc.5",
            "1.0+abc.7",
            "1.0+5",
            "1.0.post456.dev34",
            "1.0.post456",
            "1.0.15",
            "1.1.dev1",
        ]);
    }

    #[test]
    fn test_release_compared_numerically() {
        assert_ascending(&["0.9", "0.10", "1.2", "1.10", "2"]);
    }

    #[test]
    fn test_trailing_zeros_are_equal() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        assert!(v("1.0.1") > v("1.0.0"));
    }

    #[test]
    fn test_epoch_dominates() {
        assert!(v("1!0.1") > v("2024.1"));
        assert_eq!(v("0!1.0"), v("1.0"));
    }

    #[test]
    fn test_local_segments() {
        assert!(v("1.0") < v("1.0+local"));
        assert!(v("1.0+abc") < v("1.0+1"));
        assert!(v("1.0+1") < v("1.0+1.1"));
        assert!(v("1.0+2") < v("1.0+10"));
        assert_eq!(v("1.0+Ubuntu.1"), v("1.0+ubuntu-1"));
    }

    #[test]
    fn test_normalized_display() {
        assert_eq!(v("v1.0").to_string(), "1.0");
        assert_eq!(v("1.0-ALPHA1").to_string(), "1.0a1");
        assert_eq!(v("1.0.RC1").to_string(), "1.0rc1");
        assert_eq!(v("1.0c2").to_string(), "1.0rc2");
        assert_eq!(v("1.0-1").to_string(), "1.0.post1");
        assert_eq!(v("1.0.rev2").to_string(), "1.0.post2");
        assert_eq!(v("1.0-dev").to_string(), "1.0.dev0");
        assert_eq!(v("1.0b").to_string(), "1.0b0");
        assert_eq!(v("2!1.0+Local_Build.07").to_string(), "2!1.0+local.build.7");
        assert_eq!(v(" 1.2.3 ").to_string(), "1.2.3");
    }

    #[test]
    fn test_unparsed_sorts_first() {
        let garbage = v("not-a-version");
        assert!(!garbage.is_parsed());
        assert!(garbage < v("0"));
        assert!(garbage < v("0.0.dev0"));
        assert!(v("apple") < v("banana"));
        assert_eq!(garbage.to_string(), "not-a-version");
    }

    #[test]
    fn test_overflow_falls_back_to_unparsed() {
        let huge = v("99999999999999999999999.0");
        assert!(!huge.is_parsed());
    }

    #[test]
    fn test_prerelease_flag() {
        assert!(v("1.0a1").is_prerelease());
        assert!(v("1.0.dev3").is_prerelease());
        assert!(!v("1.0.post1").is_prerelease());
        assert!(!v("1.0").is_prerelease());
        assert!(!v("junk").is_prerelease());
    }

    #[test]
    fn test_accessors() {
        let parsed = ParsedVersion::parse("3!1.2rc4.post5.dev6+abc.7").unwrap();
        assert_eq!(parsed.epoch(), 3);
        assert_eq!(parsed.release(), &[1, 2]);
        assert_eq!(parsed.pre(), Some((PreRelease::Rc, 4)));
        assert_eq!(parsed.post(), Some(5));
        assert_eq!(parsed.dev(), Some(6));
        assert_eq!(
            parsed.local(),
            &[LocalSegment::Alpha("abc".to_string()), LocalSegment::Numeric(7)]
        );
    }
}
