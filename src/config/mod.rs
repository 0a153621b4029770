// ABOUTME: Configuration types and parsing for caravel.yml.
// ABOUTME: YAML parsing, discovery, and the template used by `caravel init`.

mod env_file;
mod healthcheck;
mod server;

pub use env_file::{EnvSnapshot, ParseEnvError};
pub use healthcheck::HealthcheckConfig;
pub use server::ServerConfig;

use crate::error::{Error, Result};
use crate::types::{ImageRef, ServiceName};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "caravel.yml";
pub const CONFIG_FILENAME_ALT: &str = "caravel.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".caravel/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Services that constitute one release, primary (health-checked) first.
    #[serde(deserialize_with = "deserialize_services")]
    pub services: NonEmpty<ServiceName>,

    /// Image whose tag follows the release (architecture-probed, streamed
    /// in offline mode).
    #[serde(deserialize_with = "deserialize_image_ref")]
    pub image: ImageRef,

    /// Additional pinned images to stream in offline mode (databases,
    /// caches). Their tags do not follow the release.
    #[serde(default, deserialize_with = "deserialize_image_refs")]
    pub extra_images: Vec<ImageRef>,

    /// Target host, either a mapping or compact `[user@]host[:port]`.
    #[serde(deserialize_with = "deserialize_server")]
    pub server: ServerConfig,

    pub remote: RemoteConfig,

    /// Local files copied to the remote deploy directory on every deploy.
    /// The compose file is always included.
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,

    pub healthcheck: HealthcheckConfig,

    /// Host ports the service set will bind; checked for conflicts during
    /// preflight in addition to the health check port.
    #[serde(default)]
    pub ports: Vec<u16>,

    /// Marker file written by the local validation step.
    #[serde(default = "default_validation_record")]
    pub validation_record: PathBuf,

    /// Env key the compose file reads the release tag from.
    #[serde(default = "default_tag_key")]
    pub tag_key: String,

    /// Older deployments wrote the tag under this key; rollback falls back
    /// to it when the restored snapshot lacks `tag_key`.
    #[serde(default = "default_legacy_tag_key")]
    pub legacy_tag_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Directory on the remote host that holds the release files.
    pub deploy_dir: PathBuf,

    /// Compose project name; managed containers are identified by it.
    pub project: String,

    #[serde(default = "default_compose_file")]
    pub compose_file: String,

    #[serde(default = "default_env_file")]
    pub env_file: String,
}

fn default_compose_file() -> String {
    "compose.yml".to_string()
}

fn default_env_file() -> String {
    ".env".to_string()
}

fn default_validation_record() -> PathBuf {
    PathBuf::from(".release-verified")
}

fn default_tag_key() -> String {
    "VIEWER_TAG".to_string()
}

fn default_legacy_tag_key() -> String {
    "TAG".to_string()
}

impl RemoteConfig {
    /// Absolute remote path of the current snapshot.
    pub fn env_path(&self) -> String {
        format!("{}/{}", self.deploy_dir.display(), self.env_file)
    }

    /// Absolute remote path of the single-slot previous snapshot.
    pub fn previous_env_path(&self) -> String {
        format!("{}.previous", self.env_path())
    }

    /// Absolute remote path of the compose file.
    pub fn compose_path(&self) -> String {
        format!("{}/{}", self.deploy_dir.display(), self.compose_file)
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// The primary service: first in the set, owns the health endpoint.
    pub fn primary_service(&self) -> &ServiceName {
        self.services.first()
    }

    /// All host ports to check for conflicts during preflight.
    pub fn conflict_ports(&self) -> Vec<u16> {
        let mut ports = vec![self.healthcheck.port];
        for p in &self.ports {
            if !ports.contains(p) {
                ports.push(*p);
            }
        }
        ports
    }

    pub fn template() -> Self {
        Config {
            services: NonEmpty::new(ServiceName::new("viewer").unwrap()),
            image: ImageRef::parse("ghcr.io/acme/trend-viewer").unwrap(),
            extra_images: vec![],
            server: ServerConfig {
                host: "server.example.com".to_string(),
                port: 22,
                user: Some("deploy".to_string()),
                key_path: None,
                trust_first_connection: true,
                known_hosts_path: None,
                command_timeout: None,
            },
            remote: RemoteConfig {
                deploy_dir: PathBuf::from("/opt/trendradar"),
                project: "trendradar".to_string(),
                compose_file: default_compose_file(),
                env_file: default_env_file(),
            },
            artifacts: vec![],
            healthcheck: HealthcheckConfig::template(),
            ports: vec![],
            validation_record: default_validation_record(),
            tag_key: default_tag_key(),
            legacy_tag_key: default_legacy_tag_key(),
        }
    }
}

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let config = Config::template();
    std::fs::write(&config_path, generate_template_yaml(&config))?;

    Ok(())
}

fn generate_template_yaml(config: &Config) -> String {
    format!(
        r#"services:
  - {service}
image: {image}
server:
  host: {host}
  port: {port}
  user: {user}
remote:
  deploy_dir: {deploy_dir}
  project: {project}
healthcheck:
  path: {hc_path}
  port: {hc_port}
"#,
        service = config.services.first(),
        image = config.image,
        host = config.server.host,
        port = config.server.port,
        user = config.server.user.as_deref().unwrap_or("deploy"),
        deploy_dir = config.remote.deploy_dir.display(),
        project = config.remote.project,
        hc_path = config.healthcheck.path,
        hc_port = config.healthcheck.port,
    )
}

// Custom deserializers

fn deserialize_services<'de, D>(
    deserializer: D,
) -> std::result::Result<NonEmpty<ServiceName>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    let services = values
        .iter()
        .map(|s| ServiceName::new(s))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;

    NonEmpty::from_vec(services)
        .ok_or_else(|| serde::de::Error::custom("at least one service is required"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ServerEntry {
    Simple(String),
    Detailed(ServerConfig),
}

fn deserialize_server<'de, D>(deserializer: D) -> std::result::Result<ServerConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match ServerEntry::deserialize(deserializer)? {
        ServerEntry::Simple(s) => ServerConfig::parse(&s).map_err(serde::de::Error::custom),
        ServerEntry::Detailed(config) => Ok(config),
    }
}

fn deserialize_image_ref<'de, D>(deserializer: D) -> std::result::Result<ImageRef, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    ImageRef::parse(&s).map_err(serde::de::Error::custom)
}

fn deserialize_image_refs<'de, D>(deserializer: D) -> std::result::Result<Vec<ImageRef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    values
        .iter()
        .map(|s| ImageRef::parse(s))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)
}
