// ABOUTME: Health endpoint polling configuration.
// ABOUTME: Fixed attempt budget and delay; the run's only bounded wait.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct HealthcheckConfig {
    /// HTTP path polled on the primary service.
    pub path: String,

    /// Host port the primary service listens on.
    pub port: u16,

    /// Maximum poll attempts before the release is declared unhealthy.
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Delay between attempts.
    #[serde(default = "default_delay", with = "humantime_serde")]
    pub delay: Duration,

    /// Per-attempt timeout.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_attempts() -> u32 {
    30
}

fn default_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

impl HealthcheckConfig {
    pub fn template() -> Self {
        Self {
            path: "/health".to_string(),
            port: 8080,
            attempts: default_attempts(),
            delay: default_delay(),
            timeout: default_timeout(),
        }
    }
}
