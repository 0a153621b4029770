// ABOUTME: Release executor using the type state pattern.
// ABOUTME: Every mutation before Healthy is paired with a recorded inverse.

mod backup;
mod error;
mod release;
mod rollback;
mod state;
mod transitions;

pub use backup::{BackupRecord, backup_name, is_backup_name};
pub use error::ReleaseError;
pub use release::{Release, ReleaseContext};
pub use rollback::prepare_rollback;
pub use state::{BackedUp, Committed, ConfigSwapped, Healthy, Staged, Starting};
pub use transitions::TransitionResult;
