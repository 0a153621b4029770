// ABOUTME: Container image reference parsing.
// ABOUTME: Handles registry/name:tag forms and tag substitution for releases.

use std::fmt;
use thiserror::Error;

use super::ReleaseTag;

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: '{0}'")]
    InvalidChar(char),
}

/// A container image reference: `[registry/]name[:tag]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    registry: Option<String>,
    name: String,
    tag: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        for c in input.chars() {
            if !c.is_ascii_alphanumeric()
                && c != '/'
                && c != ':'
                && c != '.'
                && c != '-'
                && c != '_'
            {
                return Err(ParseImageRefError::InvalidChar(c));
            }
        }

        let (without_tag, tag) = match input.rsplit_once(':') {
            // A colon inside a path component is a registry port, not a tag.
            Some((before, after)) if !after.contains('/') => {
                (before, Some(after.to_string()))
            }
            _ => (input, None),
        };

        let (registry, name) = match without_tag.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first.to_string()), rest.to_string())
            }
            _ => (None, without_tag.to_string()),
        };

        Ok(Self {
            registry,
            name,
            tag,
        })
    }

    /// The same image pinned to a release tag.
    pub fn with_release(&self, tag: &ReleaseTag) -> ImageRef {
        ImageRef {
            registry: self.registry.clone(),
            name: self.name.clone(),
            tag: Some(tag.as_str().to_string()),
        }
    }

    pub fn registry(&self) -> Option<&str> {
        self.registry.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref registry) = self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{}", tag)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_name() {
        let r = ImageRef::parse("viewer").unwrap();
        assert_eq!(r.registry(), None);
        assert_eq!(r.name(), "viewer");
        assert_eq!(r.tag(), None);
    }

    #[test]
    fn parses_registry_name_tag() {
        let r = ImageRef::parse("ghcr.io/acme/trend-viewer:v1.2.0").unwrap();
        assert_eq!(r.registry(), Some("ghcr.io"));
        assert_eq!(r.name(), "acme/trend-viewer");
        assert_eq!(r.tag(), Some("v1.2.0"));
    }

    #[test]
    fn registry_port_is_not_a_tag() {
        let r = ImageRef::parse("localhost:5000/viewer").unwrap();
        assert_eq!(r.registry(), Some("localhost:5000"));
        assert_eq!(r.name(), "viewer");
        assert_eq!(r.tag(), None);
    }

    #[test]
    fn with_release_replaces_tag() {
        let tag = ReleaseTag::parse("v2.3.1").unwrap();
        let r = ImageRef::parse("ghcr.io/acme/viewer:latest").unwrap();
        assert_eq!(r.with_release(&tag).to_string(), "ghcr.io/acme/viewer:v2.3.1");
    }

    #[test]
    fn rejects_shell_metacharacters() {
        assert!(ImageRef::parse("viewer$(id)").is_err());
        assert!(ImageRef::parse("a b").is_err());
    }
}
