// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "caravel")]
#[command(about = "Safe versioned release deployment for a containerized host")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output for CI
    #[arg(long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON-lines output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new caravel.yml configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Deploy a release to the configured host
    Deploy {
        /// Release tag to deploy (e.g. v2.3.1)
        tag: String,

        /// Stream images over SSH instead of pulling from a registry
        #[arg(long)]
        offline: bool,

        /// Skip the local validation record check
        #[arg(long)]
        force: bool,
    },

    /// Restore the previous release from its configuration snapshot
    Rollback,
}
