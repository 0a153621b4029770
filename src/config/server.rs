// ABOUTME: Target server configuration for the SSH connection.
// ABOUTME: Also parses compact "user@host:port" notation.

use crate::ssh::SessionConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    #[serde(default = "default_trust_first_connection")]
    pub trust_first_connection: bool,
    /// Known-hosts file to check against instead of ~/.ssh/known_hosts.
    #[serde(default)]
    pub known_hosts_path: Option<PathBuf>,
    /// Per-script execution timeout; the session default applies when unset.
    #[serde(default, with = "humantime_serde::option")]
    pub command_timeout: Option<Duration>,
}

fn default_port() -> u16 {
    22
}

fn default_trust_first_connection() -> bool {
    true
}

impl ServerConfig {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("server address cannot be empty".to_string());
        }

        // Format: [user@]host[:port]
        let (user_part, rest) = match s.find('@') {
            Some(at_pos) => (Some(&s[..at_pos]), &s[at_pos + 1..]),
            None => (None, s),
        };

        let (host, port) = match rest.rfind(':') {
            Some(colon_pos) => {
                let port_str = &rest[colon_pos + 1..];
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {}", port_str))?;
                (&rest[..colon_pos], port)
            }
            None => (rest, 22),
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        Ok(ServerConfig {
            host: host.to_string(),
            port,
            user: user_part.map(|s| s.to_string()),
            key_path: None,
            trust_first_connection: true,
            known_hosts_path: None,
            command_timeout: None,
        })
    }

    /// Build the SSH session config, resolving the login user.
    pub fn session_config(&self) -> SessionConfig {
        let user = self
            .user
            .clone()
            .unwrap_or_else(|| std::env::var("USER").unwrap_or_else(|_| "root".to_string()));

        let mut config = SessionConfig::new(&self.host, user)
            .port(self.port)
            .trust_on_first_use(self.trust_first_connection);

        if let Some(key_path) = &self.key_path {
            config = config.key_path(key_path.clone());
        }
        if let Some(known_hosts) = &self.known_hosts_path {
            config = config.known_hosts_path(known_hosts.clone());
        }
        if let Some(timeout) = self.command_timeout {
            config = config.command_timeout(timeout);
        }

        config
    }
}
