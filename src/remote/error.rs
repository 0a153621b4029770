// ABOUTME: Remote host error types with the SNAFU pattern.
// ABOUTME: Distinguishes transport failures from failed remote commands.

use snafu::Snafu;

/// Errors from remote host operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum HostError {
    #[snafu(display("SSH transport error: {source}"))]
    Transport { source: crate::ssh::Error },

    #[snafu(display("remote command '{context}' failed (exit {exit_code}): {stderr}"))]
    Command {
        context: String,
        exit_code: u32,
        stderr: String,
    },

    #[snafu(display("could not parse {what} from remote output: '{raw}'"))]
    Unparseable { what: String, raw: String },

    #[snafu(display("health probe failed: {reason}"))]
    Probe { reason: String },
}

pub type HostResult<T> = std::result::Result<T, HostError>;

impl From<crate::ssh::Error> for HostError {
    fn from(source: crate::ssh::Error) -> Self {
        HostError::Transport { source }
    }
}
