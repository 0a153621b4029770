// ABOUTME: Compile-fail test verifying health polling needs a started release.
// ABOUTME: This test should fail to compile, validating state machine safety.

use caravel::release::{BackedUp, Release};
use caravel::remote::HealthProbe;

async fn try_invalid_await_healthy<H: HealthProbe>(release: Release<BackedUp>, host: &H) {
    // ERROR: await_healthy() is only available on Release<Starting>
    release.await_healthy(host).await;
}

fn main() {}
