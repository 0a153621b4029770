// ABOUTME: Local gate run before any remote contact.
// ABOUTME: Tag format checks are non-bypassable; the validation record is.

use std::path::Path;
use thiserror::Error;

use crate::config::EnvSnapshot;
use crate::types::{ReleaseTag, ReleaseTagError};

/// Key under which the validation step records the tag it checked.
const RECORD_TAG_KEY: &str = "TAG";

#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    InvalidTag(#[from] ReleaseTagError),

    #[error(
        "no validation record at {0}: run the local validation step first \
         (or pass --force to skip this check)"
    )]
    RecordMissing(std::path::PathBuf),

    #[error("validation record at {path} is unreadable: {reason}")]
    RecordUnreadable {
        path: std::path::PathBuf,
        reason: String,
    },

    #[error("validation record at {0} has no {RECORD_TAG_KEY} entry")]
    RecordMalformed(std::path::PathBuf),

    #[error("validation record is for {recorded}, not {requested}: re-run local validation")]
    TagMismatch {
        recorded: String,
        requested: ReleaseTag,
    },
}

/// Validate the requested tag and the local validation record.
///
/// The tag pattern and floating-sentinel checks always apply; `force` only
/// skips the validation-record comparison, which guards against a forgotten
/// manual pre-check rather than against systemic risk.
pub fn check(raw_tag: &str, record_path: &Path, force: bool) -> Result<ReleaseTag, GateError> {
    let tag = ReleaseTag::parse(raw_tag)?;

    if force {
        tracing::warn!("--force: skipping local validation record check");
        return Ok(tag);
    }

    if !record_path.exists() {
        return Err(GateError::RecordMissing(record_path.to_path_buf()));
    }

    let content =
        std::fs::read_to_string(record_path).map_err(|e| GateError::RecordUnreadable {
            path: record_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let record = EnvSnapshot::parse(&content).map_err(|e| GateError::RecordUnreadable {
        path: record_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let recorded = record
        .get(RECORD_TAG_KEY)
        .ok_or_else(|| GateError::RecordMalformed(record_path.to_path_buf()))?;

    if recorded != tag.as_str() {
        return Err(GateError::TagMismatch {
            recorded: recorded.to_string(),
            requested: tag,
        });
    }

    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn record_with(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn passes_when_record_matches() {
        let record = record_with("TAG=v2.3.1\n");
        let tag = check("v2.3.1", record.path(), false).unwrap();
        assert_eq!(tag.as_str(), "v2.3.1");
    }

    #[test]
    fn fails_on_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(".release-verified");
        assert!(matches!(
            check("v2.3.1", &missing, false),
            Err(GateError::RecordMissing(_))
        ));
    }

    #[test]
    fn fails_on_mismatched_record() {
        let record = record_with("TAG=v2.3.0\n");
        assert!(matches!(
            check("v2.3.1", record.path(), false),
            Err(GateError::TagMismatch { .. })
        ));
    }

    #[test]
    fn force_skips_record_check_only() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(".release-verified");

        // Record check is skipped under force.
        assert!(check("v2.3.1", &missing, true).is_ok());

        // Tag format checks hold even under force.
        assert!(matches!(
            check("latest", &missing, true),
            Err(GateError::InvalidTag(ReleaseTagError::Floating(_)))
        ));
        assert!(matches!(
            check("2.3.1", &missing, true),
            Err(GateError::InvalidTag(ReleaseTagError::BadPattern(_)))
        ));
    }

    #[test]
    fn fails_on_record_without_tag_entry() {
        let record = record_with("CHECKED=yes\n");
        assert!(matches!(
            check("v2.3.1", record.path(), false),
            Err(GateError::RecordMalformed(_))
        ));
    }
}
