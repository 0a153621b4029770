// ABOUTME: Deploy command: gate, probe, transfer, preflight, execute.
// ABOUTME: Stages before the executor abort with zero remote mutation.

use crate::config::{Config, EnvSnapshot};
use crate::error::{Error, Result};
use crate::gate;
use crate::output::Output;
use crate::preflight;
use crate::local::{self, LocalError};
use crate::release::{Release, ReleaseContext, ReleaseError};
use crate::remote::{ContainerOps, FileOps, HealthProbe, HostInfo, SshHost};
use crate::ssh::Session;
use crate::transfer::{Transport, Transporter};
use crate::types::{Arch, ImageRef, ReleaseTag};

/// Deploy a release to the configured host.
pub async fn deploy(
    config: Config,
    raw_tag: &str,
    offline: bool,
    force: bool,
    mut output: Output,
) -> Result<()> {
    output.start_timer();

    // Local gate: no remote contact yet, zero side effects on failure.
    let tag = gate::check(raw_tag, &config.validation_record, force)?;
    let release_image = config.image.with_release(&tag);

    output.progress(&format!(
        "Deploying {} to {} ({} service(s))",
        release_image,
        config.server.host,
        config.services.len()
    ));

    // Local half of the architecture probe; needs no connection and keeps
    // the mismatch check ahead of any transfer.
    let local_arch = probe_local_arch(&release_image, offline).await?;

    output.progress(&format!("  → Connecting to {}...", config.server.host));
    let session = Session::connect(config.server.session_config()).await?;
    let host = SshHost::new(session);

    let transporter = Transporter::new(&host, &config);
    let result = deploy_on_host(
        &host,
        &transporter,
        &config,
        &tag,
        &release_image,
        local_arch,
        offline,
        &output,
    )
    .await;

    if let Err(e) = host.disconnect().await {
        tracing::warn!("disconnect failed: {e}");
    }

    match result {
        Ok(warnings) => {
            for warning in &warnings {
                output.warning(warning);
            }
            output.success(&format!("✓ Deployed {}", tag));
            Ok(())
        }
        Err(e) => {
            // The error itself is reported by main; the standing offer to
            // get back to the old release is printed here, on every failure.
            output.rollback_instruction();
            Err(e)
        }
    }
}

/// The deploy pipeline once a host connection stands: arch check, staging,
/// optional offline streaming, preflight, then the executor.
#[allow(clippy::too_many_arguments)]
pub async fn deploy_on_host<H, T>(
    host: &H,
    transport: &T,
    config: &Config,
    tag: &ReleaseTag,
    release_image: &ImageRef,
    local_arch: Arch,
    offline: bool,
    output: &Output,
) -> Result<Vec<String>>
where
    H: HostInfo + ContainerOps + FileOps + HealthProbe,
    T: Transport,
{
    // Architecture prober: both descriptors are required; no default ever
    // stands in for the remote one.
    output.progress("  → Probing architectures...");
    let remote_arch = host.host_arch().await?;
    tracing::debug!("local arch {local_arch}, remote arch {remote_arch}");

    if local_arch != remote_arch {
        return Err(Error::ArchMismatch {
            local: local_arch,
            remote: remote_arch,
        });
    }

    // Stage artifacts. Creates files in the deploy directory only; the
    // running service set is untouched.
    output.progress("  → Staging release files...");
    transport.stage_files().await?;

    let mut offline_images = vec![release_image.clone()];
    offline_images.extend(config.extra_images.iter().cloned());

    if offline {
        output.progress(&format!(
            "  → Streaming {} image(s) over SSH...",
            offline_images.len()
        ));
        transport.stream_images(&offline_images, &remote_arch).await?;
        transport.verify_images(&offline_images).await?;
    }

    // Remote preflight: read-only, aborts with no cleanup needed.
    output.progress("  → Running preflight checks...");
    preflight::run(host, config, offline, &offline_images).await?;

    // Compute the new snapshot from the current one plus the release tag.
    let snapshot = next_snapshot(host, config, tag).await?;

    run_executor(host, config, snapshot, output, false).await
}

/// Run the executor state machine from `Staged` (forward deploy) or from
/// `ConfigSwapped` (rollback re-entry with an already-restored snapshot).
pub async fn run_executor<H>(
    host: &H,
    config: &Config,
    snapshot: EnvSnapshot,
    output: &Output,
    resume_config_swapped: bool,
) -> Result<Vec<String>>
where
    H: ContainerOps + FileOps + HealthProbe,
{
    let ctx = ReleaseContext::new(config, snapshot);

    let swapped = if resume_config_swapped {
        Release::resume_restored(ctx)
    } else {
        output.progress("  → Swapping configuration snapshot...");
        Release::new(ctx).swap_config(host).await?
    };

    output.progress("  → Backing up running containers...");
    let backed_up = match swapped.backup_running(host).await {
        Ok(r) => r,
        Err((release, e)) => return Err(restore_and_report(release.restore(host).await, e).into()),
    };

    output.progress("  → Starting new release...");
    let starting = match backed_up.start_release(host).await {
        Ok(r) => r,
        // Failed to even start: restore immediately, no health polling.
        Err((release, e)) => return Err(restore_and_report(release.restore(host).await, e).into()),
    };

    output.progress("  → Waiting for health check...");
    let healthy = match starting.await_healthy(host).await {
        Ok(r) => r,
        Err((release, e)) => {
            output.progress("  → Unhealthy; restoring previous release...");
            return Err(restore_and_report(release.restore(host).await, e).into());
        }
    };

    output.progress("  → Committing (discarding backups)...");
    let committed = healthy.commit(host).await?;
    Ok(committed.finish())
}

/// When a restore succeeds the original failure is reported; when the
/// restore itself fails, that failure takes precedence since it is the one
/// needing manual intervention.
fn restore_and_report(
    restore_result: std::result::Result<(), ReleaseError>,
    original: ReleaseError,
) -> ReleaseError {
    match restore_result {
        Ok(()) => original,
        Err(recovery) => {
            tracing::error!("original failure before recovery attempt: {original}");
            recovery
        }
    }
}

/// Local half of the architecture probe.
///
/// Offline deploys require the release image in the local store. Online
/// deploys fall back to the local daemon's build architecture when the
/// image was pushed without being kept locally.
async fn probe_local_arch(release_image: &ImageRef, offline: bool) -> Result<Arch> {
    match local::image_arch(release_image).await {
        Ok(arch) => Ok(arch),
        Err(LocalError::ImageMissing(image)) if !offline => {
            tracing::warn!("{image} not in local store; using local daemon architecture");
            Ok(local::build_arch().await?)
        }
        Err(e) => Err(e.into()),
    }
}

/// Read the current snapshot (empty on first deploy) and point the tag key
/// at the new release. Unrelated keys pass through untouched.
async fn next_snapshot<H: FileOps>(
    host: &H,
    config: &Config,
    tag: &ReleaseTag,
) -> Result<EnvSnapshot> {
    let env_path = config.remote.env_path();
    let mut snapshot = if host.file_exists(&env_path).await? {
        let content = host.read_file(&env_path).await?;
        EnvSnapshot::parse(&content).map_err(ReleaseError::SnapshotInvalid)?
    } else {
        EnvSnapshot::default()
    };

    snapshot.set(&config.tag_key, tag.as_str());
    Ok(snapshot)
}
