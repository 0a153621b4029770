// ABOUTME: Standalone rollback entry: restore the previous snapshot.
// ABOUTME: Fails closed without one; forward machinery does the rest.

use crate::config::{Config, EnvSnapshot};
use crate::remote::FileOps;

use super::error::ReleaseError;

/// Restore the previous configuration snapshot as current.
///
/// Returns the restored snapshot for re-entry into the executor at
/// `ConfigSwapped` — a rollback is a forward deploy of the old snapshot,
/// reusing the same backup/health/restore machinery.
///
/// If the restored snapshot predates the current tag key, the tag is
/// inferred from the legacy key and logged as a degraded-but-successful
/// inference. The inference applies to rollback only.
///
/// # Errors
///
/// Fails closed with `NoPreviousSnapshot` when the previous slot is empty.
pub async fn prepare_rollback<H: FileOps>(
    host: &H,
    config: &Config,
) -> Result<EnvSnapshot, ReleaseError> {
    let previous_path = config.remote.previous_env_path();

    if !host.file_exists(&previous_path).await? {
        return Err(ReleaseError::NoPreviousSnapshot(previous_path));
    }

    let content = host.read_file(&previous_path).await?;
    let mut snapshot = EnvSnapshot::parse(&content)?;

    if !snapshot.contains(&config.tag_key) {
        if let Some(legacy) = snapshot.get(&config.legacy_tag_key).map(str::to_string) {
            tracing::warn!(
                "previous snapshot has no {} entry; inferred {legacy} from legacy key {}",
                config.tag_key,
                config.legacy_tag_key
            );
            snapshot.set(&config.tag_key, &legacy);
        }
    }

    host.write_file(&config.remote.env_path(), &snapshot.to_string())
        .await?;

    Ok(snapshot)
}
