// ABOUTME: Normalized CPU architecture descriptors.
// ABOUTME: Maps raw kernel/tooling strings into a small closed set.

use std::fmt;

/// A normalized CPU architecture label.
///
/// Raw strings that don't normalize into the closed set are carried through
/// in `Other` so that a comparison fails loudly downstream instead of
/// silently defaulting to "matches".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arch {
    Amd64,
    Arm64,
    Other(String),
}

impl Arch {
    /// Normalize a raw platform string (`uname -m`, image inspect output).
    pub fn normalize(raw: &str) -> Self {
        match raw.trim() {
            "x86_64" | "amd64" => Arch::Amd64,
            "aarch64" | "arm64" => Arch::Arm64,
            other => Arch::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::Other(s) => s,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
