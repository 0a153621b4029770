// ABOUTME: Read-only remote checks run before any mutation.
// ABOUTME: Ordered, abort on first failure, safe to repeat.

use thiserror::Error;

use crate::config::Config;
use crate::remote::{ContainerOps, HostError, HostInfo};
use crate::types::ImageRef;

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("container runtime or compose plugin not usable on remote host")]
    RuntimeUnavailable,

    #[error("image registry {0} unreachable from remote host")]
    RegistryUnreachable(String),

    #[error("image {0} not present on remote host (offline mode)")]
    ImageMissing(ImageRef),

    #[error("port {0} is taken by a process outside the managed service set")]
    PortConflict(u16),

    #[error(transparent)]
    Host(#[from] HostError),
}

/// Run all preflight checks in order, aborting on the first failure.
///
/// Every check here is read-only; a failing or repeated preflight never
/// requires remote cleanup.
pub async fn run<H>(
    host: &H,
    config: &Config,
    offline: bool,
    offline_images: &[ImageRef],
) -> Result<(), PreflightError>
where
    H: HostInfo + ContainerOps,
{
    if !host.runtime_available().await? {
        return Err(PreflightError::RuntimeUnavailable);
    }
    tracing::debug!("preflight: container runtime usable");

    if offline {
        for image in offline_images {
            if !host.image_present(image).await? {
                return Err(PreflightError::ImageMissing(image.clone()));
            }
        }
        tracing::debug!("preflight: all offline images present");
    } else if let Some(registry) = config.image.registry() {
        if !host.registry_reachable(registry).await? {
            return Err(PreflightError::RegistryUnreachable(registry.to_string()));
        }
        tracing::debug!("preflight: registry {registry} reachable");
    }

    let listening = host.listening_ports().await?;
    let managed = host.managed_ports(&config.remote.project).await?;
    let conflicts = conflicting_ports(&config.conflict_ports(), &listening, &managed);
    if let Some(port) = conflicts.first() {
        return Err(PreflightError::PortConflict(*port));
    }
    tracing::debug!("preflight: no port conflicts");

    Ok(())
}

/// A wanted port conflicts only when something is listening on it and no
/// managed container owns it; the running release re-using its own port is
/// the normal replace case, not a conflict.
fn conflicting_ports(wanted: &[u16], listening: &[u16], managed: &[u16]) -> Vec<u16> {
    wanted
        .iter()
        .copied()
        .filter(|p| listening.contains(p) && !managed.contains(p))
        .collect()
}
