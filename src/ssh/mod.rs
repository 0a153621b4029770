// ABOUTME: SSH transport for all remote interaction.
// ABOUTME: One persistent session per run; commands are sent as whole scripts.

mod client;
mod error;

pub use client::{CommandOutput, Session, SessionConfig};
pub use error::{Error, Result};
