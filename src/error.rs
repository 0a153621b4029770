// ABOUTME: Application-wide error types for caravel.
// ABOUTME: Wraps per-layer errors; uses thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Arch;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Gate(#[from] crate::gate::GateError),

    #[error("architecture mismatch: release image is {local}, remote host is {remote}")]
    ArchMismatch { local: Arch, remote: Arch },

    #[error("local probe failed: {0}")]
    Probe(#[from] crate::local::LocalError),

    #[error("SSH error: {0}")]
    Ssh(#[from] crate::ssh::Error),

    #[error(transparent)]
    Host(#[from] crate::remote::HostError),

    #[error(transparent)]
    Preflight(#[from] crate::preflight::PreflightError),

    #[error(transparent)]
    Transfer(#[from] crate::transfer::TransferError),

    #[error(transparent)]
    Release(#[from] crate::release::ReleaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
