// ABOUTME: Remote host operations behind capability traits.
// ABOUTME: The SSH-backed implementation drives the container runtime CLI.

mod error;
mod script;
mod ssh_host;
mod traits;

pub use error::{HostError, HostResult};
pub use script::quoted;
pub use ssh_host::SshHost;
pub use traits::{ContainerOps, ContainerState, FileOps, HealthProbe, HostInfo};
