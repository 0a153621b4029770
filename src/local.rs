// ABOUTME: Queries against the local container CLI and toolchain.
// ABOUTME: Architecture probing, image presence, and export streaming.

use thiserror::Error;
use tokio::process::{Child, ChildStdout, Command};

use crate::types::{Arch, ImageRef};

#[derive(Debug, Error)]
pub enum LocalError {
    #[error("failed to run '{command}': {reason}")]
    Spawn { command: String, reason: String },

    #[error("'{command}' failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("image not present locally: {0}")]
    ImageMissing(ImageRef),
}

async fn docker_output(args: &[&str]) -> Result<std::process::Output, LocalError> {
    Command::new("docker")
        .args(args)
        .output()
        .await
        .map_err(|e| LocalError::Spawn {
            command: format!("docker {}", args.join(" ")),
            reason: e.to_string(),
        })
}

/// Whether an image exists in the local image store.
pub async fn image_present(image: &ImageRef) -> Result<bool, LocalError> {
    let reference = image.to_string();
    let output = docker_output(&["image", "inspect", &reference]).await?;
    Ok(output.status.success())
}

/// Normalized architecture of a local image.
pub async fn image_arch(image: &ImageRef) -> Result<Arch, LocalError> {
    let reference = image.to_string();
    let args = ["image", "inspect", "--format", "{{.Architecture}}", &reference];
    let output = docker_output(&args).await?;
    if !output.status.success() {
        return Err(LocalError::ImageMissing(image.clone()));
    }
    Ok(Arch::normalize(&String::from_utf8_lossy(&output.stdout)))
}

/// Normalized architecture the local daemon builds for.
///
/// Used when the release image is not in the local store (online deploys
/// pull on the remote side) so the comparison still has a local descriptor.
pub async fn build_arch() -> Result<Arch, LocalError> {
    let args = ["info", "--format", "{{.Architecture}}"];
    let output = docker_output(&args).await?;
    if !output.status.success() {
        return Err(LocalError::CommandFailed {
            command: "docker info".to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(Arch::normalize(&String::from_utf8_lossy(&output.stdout)))
}

/// Whether rsync is installed locally.
pub async fn rsync_available() -> bool {
    Command::new("rsync")
        .arg("--version")
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Start `docker save` for an image, returning the child and its stdout
/// stream. The caller pipes stdout into the remote import path and must
/// reap the child afterwards.
pub fn save_image(image: &ImageRef) -> Result<(Child, ChildStdout), LocalError> {
    let reference = image.to_string();
    let mut child = Command::new("docker")
        .args(["save", &reference])
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| LocalError::Spawn {
            command: format!("docker save {}", reference),
            reason: e.to_string(),
        })?;

    let stdout = child.stdout.take().ok_or_else(|| LocalError::Spawn {
        command: format!("docker save {}", reference),
        reason: "no stdout pipe".to_string(),
    })?;

    Ok((child, stdout))
}
