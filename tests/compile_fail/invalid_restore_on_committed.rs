// ABOUTME: Compile-fail test verifying restore is gone once backups are.
// ABOUTME: This test should fail to compile, validating state machine safety.

use caravel::release::{Committed, Release};
use caravel::remote::{ContainerOps, FileOps};

async fn try_invalid_restore<H: ContainerOps + FileOps>(release: Release<Committed>, host: &H) {
    // ERROR: restore() is not available after commit discards the backups
    release.restore(host).await;
}

fn main() {}
