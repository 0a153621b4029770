// ABOUTME: Artifact transport to the remote host.
// ABOUTME: rsync when both ends have it, tar-over-SSH otherwise; offline image streaming.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::{Child, Command};

use crate::config::Config;
use crate::local::{self, LocalError};
use crate::remote::{HostError, HostInfo, SshHost, quoted};
use crate::types::{Arch, ImageRef};

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("artifact not found: {0}")]
    MissingArtifact(PathBuf),

    #[error("image {image} is {image_arch}, remote host is {host_arch}")]
    ArchMismatch {
        image: ImageRef,
        image_arch: Arch,
        host_arch: Arch,
    },

    #[error("rsync failed: {0}")]
    RsyncFailed(String),

    #[error("remote unpack failed: {0}")]
    UnpackFailed(String),

    #[error("image import of {image} failed: {reason}")]
    ImportFailed { image: ImageRef, reason: String },

    #[error(transparent)]
    Local(#[from] LocalError),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error("SSH error: {0}")]
    Ssh(#[from] crate::ssh::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The transfer operations the deploy pipeline runs, as a seam over the
/// concrete transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Copy the release file manifest into the remote deploy directory.
    async fn stage_files(&self) -> Result<(), TransferError>;

    /// Stream each offline image into the remote image store.
    async fn stream_images(
        &self,
        images: &[ImageRef],
        host_arch: &Arch,
    ) -> Result<(), TransferError>;

    /// Verify the remote end actually has every streamed image.
    async fn verify_images(&self, images: &[ImageRef]) -> Result<(), TransferError>;
}

/// Moves release files and, optionally, image archives to the remote host.
pub struct Transporter<'a> {
    host: &'a SshHost,
    config: &'a Config,
}

impl<'a> Transporter<'a> {
    pub fn new(host: &'a SshHost, config: &'a Config) -> Self {
        Self { host, config }
    }

    /// The fixed file manifest for one release: the compose file plus any
    /// configured artifacts, deduplicated.
    pub fn manifest(&self) -> Vec<PathBuf> {
        let mut files = vec![PathBuf::from(&self.config.remote.compose_file)];
        for artifact in &self.config.artifacts {
            if !files.contains(artifact) {
                files.push(artifact.clone());
            }
        }
        files
    }

    async fn rsync_usable(&self) -> bool {
        if !local::rsync_available().await {
            return false;
        }
        self.host
            .session()
            .exec("command -v rsync >/dev/null 2>&1")
            .await
            .map(|o| o.success())
            .unwrap_or(false)
    }

    /// rsync with an argv vector; nothing here passes through a local shell.
    async fn rsync_files(&self, files: &[PathBuf], deploy_dir: &str) -> Result<(), TransferError> {
        let server = &self.config.server;
        let user = server
            .user
            .clone()
            .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "root".to_string()));

        let mut command = Command::new("rsync");
        command
            .arg("-az")
            .arg("--relative")
            .arg("-e")
            .arg(format!("ssh -p {}", server.port));
        for file in files {
            command.arg(file);
        }
        command.arg(format!("{}@{}:{}/", user, server.host, deploy_dir));

        let output = command
            .output()
            .await
            .map_err(|e| TransferError::RsyncFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(TransferError::RsyncFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    /// Pack the manifest into one tar stream and unpack it remotely over
    /// the already-authenticated channel.
    async fn tar_files(&self, files: &[PathBuf], deploy_dir: &str) -> Result<(), TransferError> {
        let archive = build_archive(files)?;

        let script = format!("tar -xf - -C {}", quoted(deploy_dir));
        let output = self
            .host
            .session()
            .exec_with_input(&script, archive.as_slice())
            .await?;

        if !output.success() {
            return Err(TransferError::UnpackFailed(output.stderr.trim().to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for Transporter<'_> {
    async fn stage_files(&self) -> Result<(), TransferError> {
        let manifest = self.manifest();
        for file in &manifest {
            if !file.exists() {
                return Err(TransferError::MissingArtifact(file.clone()));
            }
        }

        let deploy_dir = self.config.remote.deploy_dir.display().to_string();
        self.host
            .session()
            .exec(&format!("mkdir -p {}", quoted(&deploy_dir)))
            .await?;

        if self.rsync_usable().await {
            tracing::debug!("transfer: staging {} file(s) via rsync", manifest.len());
            self.rsync_files(&manifest, &deploy_dir).await
        } else {
            tracing::debug!("transfer: staging {} file(s) via tar stream", manifest.len());
            self.tar_files(&manifest, &deploy_dir).await
        }
    }

    /// Per image: verify it exists locally, verify its architecture equals
    /// the remote's, then pipe `docker save` into the remote load. The
    /// first failure aborts the whole transfer.
    async fn stream_images(
        &self,
        images: &[ImageRef],
        host_arch: &Arch,
    ) -> Result<(), TransferError> {
        for image in images {
            if !local::image_present(image).await? {
                return Err(TransferError::Local(LocalError::ImageMissing(image.clone())));
            }

            let image_arch = local::image_arch(image).await?;
            if &image_arch != host_arch {
                return Err(TransferError::ArchMismatch {
                    image: image.clone(),
                    image_arch,
                    host_arch: host_arch.clone(),
                });
            }

            tracing::info!("transfer: streaming image {image} ({image_arch})");
            let (mut child, stdout) = local::save_image(image)?;

            let output = match self
                .host
                .session()
                .exec_with_input("docker load", stdout)
                .await
            {
                Ok(output) => output,
                // The save child is still writing into a pipe nobody reads;
                // reap it before surfacing the channel error.
                Err(e) => {
                    abort_save(child).await;
                    return Err(e.into());
                }
            };

            let status = child.wait().await?;
            if !status.success() {
                return Err(TransferError::ImportFailed {
                    image: image.clone(),
                    reason: "docker save exited non-zero".to_string(),
                });
            }
            if !output.success() {
                return Err(TransferError::ImportFailed {
                    image: image.clone(),
                    reason: output.stderr.trim().to_string(),
                });
            }
        }
        Ok(())
    }

    async fn verify_images(&self, images: &[ImageRef]) -> Result<(), TransferError> {
        for image in images {
            if !self.host.image_present(image).await? {
                return Err(TransferError::ImportFailed {
                    image: image.clone(),
                    reason: "image missing after import".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Kill an abandoned local pipeline child and collect its exit status so it
/// never lingers as a zombie.
async fn abort_save(mut child: Child) -> Option<std::process::ExitStatus> {
    child.kill().await.ok()?;
    child.wait().await.ok()
}

/// Build an in-memory tar archive of the manifest, preserving relative
/// paths. Absolute paths are flattened to their file name.
fn build_archive(files: &[PathBuf]) -> Result<Vec<u8>, TransferError> {
    let mut builder = tar::Builder::new(Vec::new());
    for file in files {
        let name = archive_name(file);
        builder
            .append_path_with_name(file, name)
            .map_err(TransferError::Io)?;
    }
    builder.into_inner().map_err(TransferError::Io)
}

fn archive_name(path: &Path) -> PathBuf {
    if path.is_absolute() {
        PathBuf::from(path.file_name().unwrap_or_default())
    } else {
        path.components()
            .filter(|c| !matches!(c, std::path::Component::CurDir))
            .collect()
    }
}
