// ABOUTME: State transition methods for the release executor.
// ABOUTME: Each method consumes self and returns the next state on success.

use std::marker::PhantomData;

use chrono::Utc;

use crate::remote::{ContainerOps, FileOps, HealthProbe};

use super::Release;
use super::backup::{BackupRecord, backup_name, is_backup_name};
use super::error::ReleaseError;
use super::state::{BackedUp, Committed, ConfigSwapped, Healthy, Staged, Starting};

/// Result type for transitions that may need restore on failure.
///
/// The error side hands back the release value so the caller can invoke
/// `restore()` with every backup record created so far.
pub type TransitionResult<T, S> = Result<Release<T>, (Release<S>, ReleaseError)>;

impl<S> Release<S> {
    fn transition<T>(self) -> Release<T> {
        Release {
            ctx: self.ctx,
            backups: self.backups,
            warnings: self.warnings,
            _state: PhantomData,
        }
    }

    /// Best-effort restore of the pre-run state: tear down whatever the new
    /// release started, rename every backup to its original name, restart
    /// what was running, and put the previous snapshot back as current.
    ///
    /// Individual failures don't stop the sweep; they are collected and
    /// surfaced as `RecoveryFailed`, the one outcome that needs a human.
    async fn restore_inner<H>(self, host: &H, teardown_new: bool) -> Result<(), ReleaseError>
    where
        H: ContainerOps + FileOps,
    {
        let ctx = &self.ctx;
        let mut failures: Vec<String> = Vec::new();

        // Teardown goes by explicit container name, never through compose:
        // compose selects containers by project/service labels, which a
        // rename does not change, so a label-scoped removal would take the
        // parked backups with it.
        if teardown_new {
            for service in &ctx.services {
                let containers = match host.service_containers(&ctx.project, service).await {
                    Ok(c) => c,
                    Err(e) => {
                        failures.push(format!("could not list containers of {service}: {e}"));
                        continue;
                    }
                };
                for container in containers {
                    if is_backup_name(&container.name) {
                        continue;
                    }
                    if let Err(e) = host.remove_container(&container.name).await {
                        failures.push(format!("could not remove {}: {e}", container.name));
                    }
                }
            }
        }

        for record in self.backups.iter().rev() {
            if let Err(e) = host.rename_container(&record.backup, &record.original).await {
                failures.push(format!(
                    "could not rename {} back to {}: {e}",
                    record.backup, record.original
                ));
                continue;
            }
            if record.was_running
                && let Err(e) = host.start_container(&record.original).await
            {
                failures.push(format!("could not restart {}: {e}", record.original));
            }
        }

        match host.file_exists(&ctx.previous_env_path).await {
            Ok(true) => {
                if let Err(e) = host.copy_file(&ctx.previous_env_path, &ctx.env_path).await {
                    failures.push(format!("could not restore configuration snapshot: {e}"));
                }
            }
            // First deploy: there was no previous snapshot to put back.
            Ok(false) => {}
            Err(e) => failures.push(format!("could not check previous snapshot: {e}")),
        }

        if failures.is_empty() {
            tracing::info!("previous release restored");
            Ok(())
        } else {
            Err(ReleaseError::RecoveryFailed {
                details: failures.join("; "),
                instructions: format!(
                    "on the host, inspect containers named *-backup-* in project '{}', \
                     rename them back with 'docker rename', and restore {} from {}",
                    ctx.project, ctx.env_path, ctx.previous_env_path
                ),
            })
        }
    }
}

// =============================================================================
// Staged -> ConfigSwapped
// =============================================================================

impl Release<Staged> {
    /// Copy the current snapshot into the single previous slot (overwriting
    /// any older one), then write the new snapshot as current.
    ///
    /// This is the first state-mutating action of a deploy and is itself
    /// reversible by restoring the previous slot.
    pub async fn swap_config<H: FileOps>(
        self,
        host: &H,
    ) -> Result<Release<ConfigSwapped>, ReleaseError> {
        let ctx = &self.ctx;

        if host.file_exists(&ctx.env_path).await? {
            host.copy_file(&ctx.env_path, &ctx.previous_env_path)
                .await?;
            tracing::debug!("previous snapshot saved to {}", ctx.previous_env_path);
        } else {
            tracing::debug!("no current snapshot; first deploy to this host");
        }

        host.write_file(&ctx.env_path, &ctx.snapshot.to_string())
            .await?;
        Ok(self.transition())
    }
}

// =============================================================================
// ConfigSwapped -> BackedUp
// =============================================================================

impl Release<ConfigSwapped> {
    /// Park every running container of the service set under a timestamped
    /// backup name, recording the rename for commit or restore.
    ///
    /// Services with no running container contribute no backup handle.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` with the records created so far, so the
    /// caller can `restore()`.
    #[must_use = "release state must be used"]
    pub async fn backup_running<H: ContainerOps>(
        mut self,
        host: &H,
    ) -> TransitionResult<BackedUp, ConfigSwapped> {
        let now = Utc::now();
        let services = self.ctx.services.clone();
        let project = self.ctx.project.clone();

        for service in &services {
            let containers = match host.service_containers(&project, service).await {
                Ok(c) => c,
                Err(e) => return Err((self, e.into())),
            };

            for container in containers {
                if !container.running || is_backup_name(&container.name) {
                    continue;
                }

                if let Err(e) = host.stop_container(&container.name).await {
                    return Err((self, e.into()));
                }

                let backup = backup_name(&container.name, now);
                if let Err(e) = host.rename_container(&container.name, &backup).await {
                    // Stopped under its original name but not parked; bring
                    // it back up so the old release keeps answering.
                    let _ = host.start_container(&container.name).await;
                    return Err((self, e.into()));
                }

                tracing::debug!("parked {} as {}", container.name, backup);
                self.backups.push(BackupRecord {
                    original: container.name,
                    backup,
                    was_running: true,
                });
            }
        }

        Ok(self.transition())
    }

    /// Restore: undo any partial backups and the config swap.
    pub async fn restore<H: ContainerOps + FileOps>(self, host: &H) -> Result<(), ReleaseError> {
        self.restore_inner(host, false).await
    }
}

// =============================================================================
// BackedUp -> Starting
// =============================================================================

impl Release<BackedUp> {
    /// Bring up the full service set under the new snapshot.
    ///
    /// If the bring-up itself fails, no health polling happens; the caller
    /// must `restore()` immediately.
    #[must_use = "release state must be used"]
    pub async fn start_release<H: ContainerOps>(
        self,
        host: &H,
    ) -> TransitionResult<Starting, BackedUp> {
        let result = host
            .compose_up(
                &self.ctx.project,
                &self.ctx.deploy_dir,
                &self.ctx.compose_file,
                &self.ctx.services,
            )
            .await;

        match result {
            Ok(()) => Ok(self.transition()),
            Err(e) => {
                let err = ReleaseError::StartFailed(e.to_string());
                Err((self, err))
            }
        }
    }

    /// Restore: remove whatever the failed bring-up left behind, rename
    /// backups back, restart them, and restore the previous snapshot.
    pub async fn restore<H: ContainerOps + FileOps>(self, host: &H) -> Result<(), ReleaseError> {
        self.restore_inner(host, true).await
    }
}

// =============================================================================
// Starting -> Healthy
// =============================================================================

impl Release<Starting> {
    /// Poll the primary service's health endpoint with the fixed attempt
    /// budget. Exhausting the budget is definite failure, never "unknown".
    #[must_use = "release state must be used"]
    pub async fn await_healthy<H: HealthProbe>(
        self,
        host: &H,
    ) -> TransitionResult<Healthy, Starting> {
        let hc = self.ctx.healthcheck.clone();

        for attempt in 1..=hc.attempts {
            match host.probe(hc.port, &hc.path, hc.timeout).await {
                Ok(true) => {
                    tracing::info!("health check passed on attempt {attempt}/{}", hc.attempts);
                    return Ok(self.transition());
                }
                Ok(false) => {
                    tracing::debug!("health check attempt {attempt}/{} not passing", hc.attempts);
                }
                Err(e) => {
                    tracing::debug!("health probe attempt {attempt}/{} errored: {e}", hc.attempts);
                }
            }
            if attempt < hc.attempts {
                tokio::time::sleep(hc.delay).await;
            }
        }

        let attempts = hc.attempts;
        Err((self, ReleaseError::Unhealthy { attempts }))
    }

    /// Restore: tear down the unhealthy new set, rename backups back,
    /// restart them, and restore the previous snapshot.
    pub async fn restore<H: ContainerOps + FileOps>(self, host: &H) -> Result<(), ReleaseError> {
        self.restore_inner(host, true).await
    }
}

// =============================================================================
// Healthy -> Committed
// =============================================================================

impl Release<Healthy> {
    /// Discard every backup container permanently. The previous snapshot
    /// slot stays in place as the target of a future rollback.
    ///
    /// A backup that refuses to delete is a warning, not a deploy failure;
    /// the new release is already serving.
    pub async fn commit<H: ContainerOps>(
        mut self,
        host: &H,
    ) -> Result<Release<Committed>, ReleaseError> {
        let backups = std::mem::take(&mut self.backups);
        for record in &backups {
            if let Err(e) = host.remove_container(&record.backup).await {
                let warning = format!("could not remove backup container {}: {e}", record.backup);
                tracing::warn!("{warning}");
                self.warnings.push(warning);
            } else {
                tracing::debug!("removed backup container {}", record.backup);
            }
        }
        Ok(self.transition())
    }
}

// =============================================================================
// Committed - Terminal State
// =============================================================================

impl Release<Committed> {
    /// Non-fatal issues encountered while discarding backups.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Consume the release, yielding its warnings.
    pub fn finish(self) -> Vec<String> {
        self.warnings
    }
}
