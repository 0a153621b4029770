// ABOUTME: Release tag validation.
// ABOUTME: Rejects floating tags and enforces the v-prefixed version pattern.

use std::fmt;
use thiserror::Error;

/// Tags that float to whatever was pushed last. Deploying one makes the
/// running version unknowable, so they are rejected unconditionally.
const FLOATING_TAGS: &[&str] = &["latest"];

#[derive(Debug, Error)]
pub enum ReleaseTagError {
    #[error("release tag cannot be empty")]
    Empty,

    #[error("floating tag '{0}' cannot be deployed; use a versioned tag like v1.2.3")]
    Floating(String),

    #[error("release tag '{0}' must start with 'v' followed by a digit (e.g. v2.3.1)")]
    BadPattern(String),

    #[error("invalid character in release tag: '{0}'")]
    InvalidChar(char),
}

/// An opaque, validated release version identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseTag(String);

impl ReleaseTag {
    pub fn parse(value: &str) -> Result<Self, ReleaseTagError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ReleaseTagError::Empty);
        }

        if FLOATING_TAGS.contains(&value) {
            return Err(ReleaseTagError::Floating(value.to_string()));
        }

        let mut chars = value.chars();
        if chars.next() != Some('v') {
            return Err(ReleaseTagError::BadPattern(value.to_string()));
        }
        match chars.next() {
            Some(c) if c.is_ascii_digit() => {}
            _ => return Err(ReleaseTagError::BadPattern(value.to_string())),
        }

        for c in value.chars() {
            if !c.is_ascii_alphanumeric() && c != '.' && c != '-' && c != '_' {
                return Err(ReleaseTagError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_semver_style_tags() {
        for tag in ["v1", "v2.3.1", "v0.1.0-rc1", "v10.0.0_hotfix"] {
            assert_eq!(ReleaseTag::parse(tag).unwrap().as_str(), tag);
        }
    }

    #[test]
    fn rejects_latest() {
        assert!(matches!(
            ReleaseTag::parse("latest"),
            Err(ReleaseTagError::Floating(_))
        ));
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(matches!(ReleaseTag::parse(""), Err(ReleaseTagError::Empty)));
        assert!(matches!(
            ReleaseTag::parse("   "),
            Err(ReleaseTagError::Empty)
        ));
    }

    #[test]
    fn rejects_unprefixed_versions() {
        assert!(matches!(
            ReleaseTag::parse("2.3.1"),
            Err(ReleaseTagError::BadPattern(_))
        ));
        assert!(matches!(
            ReleaseTag::parse("version-2"),
            Err(ReleaseTagError::BadPattern(_))
        ));
        assert!(matches!(
            ReleaseTag::parse("v"),
            Err(ReleaseTagError::BadPattern(_))
        ));
    }

    #[test]
    fn rejects_shell_metacharacters() {
        assert!(matches!(
            ReleaseTag::parse("v1;rm"),
            Err(ReleaseTagError::InvalidChar(';'))
        ));
        assert!(matches!(
            ReleaseTag::parse("v1 2"),
            Err(ReleaseTagError::InvalidChar(' '))
        ));
    }
}
