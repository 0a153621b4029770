// ABOUTME: Command implementations wiring the pipeline stages together.
// ABOUTME: deploy and rollback share the executor; rollback skips the gate.

mod deploy;
mod rollback;

pub use deploy::{deploy, deploy_on_host, run_executor};
pub use rollback::{rollback, rollback_on_host};
