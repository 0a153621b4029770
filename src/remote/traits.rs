// ABOUTME: Capability traits for remote host operations.
// ABOUTME: The release executor and preflight are generic over these seams.

use async_trait::async_trait;
use std::time::Duration;

use super::error::HostResult;
use crate::types::{Arch, ImageRef, ServiceName};

/// A container belonging to the managed project, as seen on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerState {
    pub name: String,
    pub running: bool,
}

/// Read-only facts about the remote host and its runtime.
#[async_trait]
pub trait HostInfo: Send + Sync {
    /// Normalized CPU architecture of the host.
    async fn host_arch(&self) -> HostResult<Arch>;

    /// Whether the container runtime and its compose plugin are usable.
    async fn runtime_available(&self) -> HostResult<bool>;

    /// Whether the image registry answers from the host.
    async fn registry_reachable(&self, registry: &str) -> HostResult<bool>;

    /// Whether an image is present in the host's local image store.
    async fn image_present(&self, image: &ImageRef) -> HostResult<bool>;

    /// Host ports with a listening TCP socket.
    async fn listening_ports(&self) -> HostResult<Vec<u16>>;
}

/// Container lifecycle operations against the managed project.
#[async_trait]
pub trait ContainerOps: Send + Sync {
    /// Containers (running or not) belonging to a service of the project.
    async fn service_containers(
        &self,
        project: &str,
        service: &ServiceName,
    ) -> HostResult<Vec<ContainerState>>;

    /// Host ports currently published by containers of the project.
    async fn managed_ports(&self, project: &str) -> HostResult<Vec<u16>>;

    async fn stop_container(&self, name: &str) -> HostResult<()>;

    async fn start_container(&self, name: &str) -> HostResult<()>;

    async fn rename_container(&self, name: &str, new_name: &str) -> HostResult<()>;

    async fn remove_container(&self, name: &str) -> HostResult<()>;

    /// Bring up the named services from the compose file in `deploy_dir`.
    ///
    /// Contract: parked `*-backup-*` containers of the project must survive
    /// the bring-up untouched. An implementation that cannot guarantee this
    /// must detect the violation and fail rather than report success over a
    /// consumed backup.
    async fn compose_up(
        &self,
        project: &str,
        deploy_dir: &str,
        compose_file: &str,
        services: &[ServiceName],
    ) -> HostResult<()>;
}

/// Whole-file operations on the remote filesystem.
#[async_trait]
pub trait FileOps: Send + Sync {
    async fn file_exists(&self, path: &str) -> HostResult<bool>;

    async fn read_file(&self, path: &str) -> HostResult<String>;

    /// Replace the file's content atomically enough for our purposes
    /// (write then rename is not required; the file has one writer).
    async fn write_file(&self, path: &str, content: &str) -> HostResult<()>;

    async fn copy_file(&self, from: &str, to: &str) -> HostResult<()>;
}

/// HTTP health probing of a service port on the host.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// One probe attempt. `Ok(true)` means the endpoint answered with a
    /// non-error status within `timeout`.
    async fn probe(&self, port: u16, path: &str, timeout: Duration) -> HostResult<bool>;
}
