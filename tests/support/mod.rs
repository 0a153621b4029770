// ABOUTME: Test support utilities.
// ABOUTME: Provides the scripted mock host and a baseline config for tests.

use std::sync::Once;

// Each test binary only uses some of these helpers, so allow dead_code.
#[allow(dead_code)]
pub mod mock_host;
#[allow(dead_code)]
pub mod mock_transport;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("caravel=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A two-service config pointed at a mock host. The health check delay is
/// near-zero so exhaustion tests finish quickly.
#[allow(dead_code)]
pub fn test_config() -> caravel::config::Config {
    caravel::config::Config::from_yaml(
        r#"
services:
  - viewer
  - fetcher
image: ghcr.io/acme/trend-viewer
server:
  host: host.example.com
  user: deploy
remote:
  deploy_dir: /opt/trendradar
  project: trendradar
healthcheck:
  path: /health
  port: 8080
  attempts: 3
  delay: 1ms
  timeout: 5s
"#,
    )
    .unwrap()
}
