// ABOUTME: Error types for release executor operations.
// ABOUTME: RecoveryFailed is the one case outside the recoverability guarantee.

use thiserror::Error;

use crate::config::ParseEnvError;
use crate::remote::HostError;

#[derive(Debug, Error)]
pub enum ReleaseError {
    /// Rollback fails closed when the single previous slot is empty.
    #[error("no previous configuration snapshot at {0}; nothing to roll back to")]
    NoPreviousSnapshot(String),

    #[error("configuration snapshot is invalid: {0}")]
    SnapshotInvalid(#[from] ParseEnvError),

    #[error("new release failed to start: {0}")]
    StartFailed(String),

    #[error("release never became healthy within {attempts} attempts")]
    Unhealthy { attempts: u32 },

    #[error(transparent)]
    Host(#[from] HostError),

    /// Restoring the previous release itself failed. This is the single
    /// case the design cannot recover from automatically.
    #[error("RECOVERY FAILED: {details}. Manual intervention required: {instructions}")]
    RecoveryFailed {
        details: String,
        instructions: String,
    },
}
