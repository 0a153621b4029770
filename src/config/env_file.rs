// ABOUTME: Key=value env-file codec for the remote configuration snapshot.
// ABOUTME: Round-trips comments and unrelated keys; writes are whole-file.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseEnvError {
    #[error("line {line}: expected KEY=value, got '{content}'")]
    Malformed { line: usize, content: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// Comment or blank line, kept verbatim.
    Raw(String),
    Pair { key: String, value: String },
}

/// An in-memory configuration snapshot (the remote `.env` file).
///
/// The orchestrator only ever sets the keys it owns and rewrites the whole
/// file; every unrelated line survives a deploy byte-for-byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    lines: Vec<Line>,
}

impl EnvSnapshot {
    pub fn parse(content: &str) -> Result<Self, ParseEnvError> {
        let mut lines = Vec::new();
        for (idx, raw) in content.lines().enumerate() {
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                lines.push(Line::Raw(raw.to_string()));
                continue;
            }
            match raw.split_once('=') {
                Some((key, value)) => lines.push(Line::Pair {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                }),
                None => {
                    return Err(ParseEnvError::Malformed {
                        line: idx + 1,
                        content: raw.to_string(),
                    });
                }
            }
        }
        Ok(Self { lines })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|l| match l {
            Line::Pair { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set a key, replacing the existing entry or appending a new one.
    pub fn set(&mut self, key: &str, value: &str) {
        for line in &mut self.lines {
            if let Line::Pair { key: k, value: v } = line
                && k == key
            {
                *v = value.to_string();
                return;
            }
        }
        self.lines.push(Line::Pair {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for EnvSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            match line {
                Line::Raw(raw) => writeln!(f, "{}", raw)?,
                Line::Pair { key, value } => writeln!(f, "{}={}", key, value)?,
            }
        }
        Ok(())
    }
}
