// ABOUTME: Compile-fail test verifying commit cannot be called on Staged.
// ABOUTME: This test should fail to compile, validating state machine safety.

use caravel::config::{Config, EnvSnapshot};
use caravel::release::{Release, ReleaseContext, Staged};
use caravel::remote::ContainerOps;

async fn try_invalid_commit<H: ContainerOps>(host: &H) {
    let config = Config::template();
    let release: Release<Staged> = Release::new(ReleaseContext::new(&config, EnvSnapshot::default()));

    // ERROR: commit() is only available on Release<Healthy>
    release.commit(host).await;
}

fn main() {}
