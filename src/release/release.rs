// ABOUTME: Generic release struct parameterized by state marker.
// ABOUTME: Carries the snapshot to deploy and the backup records of the run.

use std::marker::PhantomData;

use crate::config::{Config, EnvSnapshot, HealthcheckConfig};
use crate::types::ServiceName;

use super::backup::BackupRecord;
use super::state::{ConfigSwapped, Staged};

/// Everything the executor needs about one run, resolved up front.
#[derive(Debug, Clone)]
pub struct ReleaseContext {
    pub project: String,
    pub deploy_dir: String,
    pub compose_file: String,
    pub env_path: String,
    pub previous_env_path: String,
    pub services: Vec<ServiceName>,
    pub healthcheck: HealthcheckConfig,
    /// The configuration snapshot this run deploys as current.
    pub snapshot: EnvSnapshot,
}

impl ReleaseContext {
    pub fn new(config: &Config, snapshot: EnvSnapshot) -> Self {
        Self {
            project: config.remote.project.clone(),
            deploy_dir: config.remote.deploy_dir.display().to_string(),
            compose_file: config.remote.compose_file.clone(),
            env_path: config.remote.env_path(),
            previous_env_path: config.remote.previous_env_path(),
            services: config.services.iter().cloned().collect(),
            healthcheck: config.healthcheck.clone(),
            snapshot,
        }
    }
}

/// A release run in progress, parameterized by its current state.
#[derive(Debug)]
pub struct Release<S> {
    pub(crate) ctx: ReleaseContext,
    pub(crate) backups: Vec<BackupRecord>,
    pub(crate) warnings: Vec<String>,
    pub(crate) _state: PhantomData<S>,
}

impl Release<Staged> {
    /// A forward deploy: artifacts staged, nothing mutated yet.
    pub fn new(ctx: ReleaseContext) -> Self {
        Release {
            ctx,
            backups: Vec::new(),
            warnings: Vec::new(),
            _state: PhantomData,
        }
    }
}

impl Release<ConfigSwapped> {
    /// Rollback entry point: the restored snapshot is already written as
    /// current, so the run re-enters past the config swap.
    pub fn resume_restored(ctx: ReleaseContext) -> Self {
        Release {
            ctx,
            backups: Vec::new(),
            warnings: Vec::new(),
            _state: PhantomData,
        }
    }
}

impl<S> Release<S> {
    pub fn context(&self) -> &ReleaseContext {
        &self.ctx
    }

    /// Backup records created so far in this run.
    pub fn backups(&self) -> &[BackupRecord] {
        &self.backups
    }
}
