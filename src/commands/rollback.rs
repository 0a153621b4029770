// ABOUTME: Rollback command: forward-deploy the previous snapshot.
// ABOUTME: Skips the gate; fails closed when no previous snapshot exists.

use crate::config::Config;
use crate::error::Result;
use crate::output::Output;
use crate::release::prepare_rollback;
use crate::remote::{ContainerOps, FileOps, HealthProbe, SshHost};
use crate::ssh::Session;

use super::deploy::run_executor;

/// Restore the previous release on the configured host.
///
/// No new artifact is involved, so the tag-format and validation-record
/// checks don't apply. The restored snapshot re-enters the executor at
/// `ConfigSwapped`, reusing the same backup/health/restore machinery as a
/// forward deploy.
pub async fn rollback(config: Config, mut output: Output) -> Result<()> {
    output.start_timer();

    output.progress(&format!(
        "Rolling back {} on {}",
        config.remote.project, config.server.host
    ));

    output.progress(&format!("  → Connecting to {}...", config.server.host));
    let session = Session::connect(config.server.session_config()).await?;
    let host = SshHost::new(session);

    let result = rollback_on_host(&host, &config, &output).await;

    if let Err(e) = host.disconnect().await {
        tracing::warn!("disconnect failed: {e}");
    }

    match result {
        Ok(warnings) => {
            for warning in &warnings {
                output.warning(warning);
            }
            output.success("✓ Previous release restored");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// The rollback pipeline once a host connection stands.
pub async fn rollback_on_host<H>(host: &H, config: &Config, output: &Output) -> Result<Vec<String>>
where
    H: ContainerOps + FileOps + HealthProbe,
{
    output.progress("  → Restoring previous configuration snapshot...");
    let snapshot = prepare_rollback(host, config).await?;

    if let Some(tag) = snapshot.get(&config.tag_key) {
        output.progress(&format!("  → Previous release is {tag}"));
    }

    run_executor(host, config, snapshot, output, true).await
}
