use ghpi_schema::PackageFile;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Owner,
    Repo,
    Tag,
    Filename,
    Name,
    Version,
}

impl Field {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "owner" => Some(Self::Owner),
            "repo" => Some(Self::Repo),
            "tag" => Some(Self::Tag),
            "filename" => Some(Self::Filename),
            "name" => Some(Self::Name),
            "version" => Some(Self::Version),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// Download URL override, e.g.
/// `https://mirror.example.com/{owner}/{repo}/{tag}/{filename}`.
///
/// Placeholders: `{owner}`, `{repo}`, `{tag}`, `{filename}`, `{name}`
/// (normalized package name) and `{version}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    /// Validate a template.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrlTemplate`] for an empty template,
    /// unknown placeholders or unbalanced braces.
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrlTemplate {
            template: template.to_string(),
            reason,
        };
        if template.trim().is_empty() {
            return Err(invalid("template is empty".to_string()));
        }

        let mut segments = Vec::new();
        let mut rest = template;
        while let Some(pos) = rest.find(['{', '}']) {
            if rest[pos..].starts_with('}') {
                return Err(invalid("unmatched '}'".to_string()));
            }
            if pos > 0 {
                segments.push(Segment::Literal(rest[..pos].to_string()));
            }
            let after = &rest[pos + 1..];
            let close = after
                .find('}')
                .ok_or_else(|| invalid("unclosed '{'".to_string()))?;
            let key = &after[..close];
            let field = Field::from_key(key)
                .ok_or_else(|| invalid(format!("unknown placeholder '{{{key}}}'")))?;
            segments.push(Segment::Field(field));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// The template as given.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Substitute a file's fields. Values are inserted verbatim.
    pub fn expand(&self, file: &PackageFile) -> String {
        let mut out = String::with_capacity(self.source.len() + file.filename.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(Field::Owner) => out.push_str(&file.origin.owner),
                Segment::Field(Field::Repo) => out.push_str(&file.origin.repo),
                Segment::Field(Field::Tag) => out.push_str(&file.origin.tag),
                Segment::Field(Field::Filename) => out.push_str(&file.filename),
                Segment::Field(Field::Name) => out.push_str(file.package_name.as_str()),
                Segment::Field(Field::Version) => out.push_str(&file.version.to_string()),
            }
        }
        out
    }
}
