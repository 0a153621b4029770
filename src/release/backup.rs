// ABOUTME: Backup-by-rename records for running containers.
// ABOUTME: Created before mutation, consumed exactly once by commit or restore.

use chrono::{DateTime, Utc};

const BACKUP_INFIX: &str = "-backup-";

/// The undo record for one renamed container.
///
/// Lives only for the duration of one executor run; the commit path removes
/// the backup container, the restore path renames it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    /// Name the container ran under before this deploy.
    pub original: String,
    /// Timestamped name it was parked under.
    pub backup: String,
    /// Whether it was running when backed up (restore restarts it).
    pub was_running: bool,
}

/// Deterministic, self-describing backup name for a container.
pub fn backup_name(original: &str, at: DateTime<Utc>) -> String {
    format!("{}{}{}", original, BACKUP_INFIX, at.format("%Y%m%dT%H%M%S"))
}

/// Whether a container name is a parked backup from a previous or current
/// run. Backups are never backed up again.
pub fn is_backup_name(name: &str) -> bool {
    name.contains(BACKUP_INFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn backup_names_are_deterministic_and_timestamped() {
        let at = Utc.with_ymd_and_hms(2026, 8, 24, 12, 30, 5).unwrap();
        assert_eq!(
            backup_name("trendradar-viewer-1", at),
            "trendradar-viewer-1-backup-20260824T123005"
        );
    }

    #[test]
    fn backup_names_are_recognized() {
        let at = Utc::now();
        assert!(is_backup_name(&backup_name("viewer", at)));
        assert!(!is_backup_name("trendradar-viewer-1"));
    }
}
