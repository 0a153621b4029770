// ABOUTME: Entry point for the caravel CLI application.
// ABOUTME: Parses arguments and dispatches to command handlers.

mod cli;

use caravel::config::{self, Config};
use caravel::error::Result;
use caravel::output::{Output, OutputMode};
use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode);

    if let Err(e) = run(cli, output).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, force)
        }
        Commands::Deploy {
            tag,
            offline,
            force,
        } => {
            let cwd = env::current_dir()?;
            let config = Config::discover(&cwd)?;
            caravel::commands::deploy(config, &tag, offline, force, output).await
        }
        Commands::Rollback => {
            let cwd = env::current_dir()?;
            let config = Config::discover(&cwd)?;
            caravel::commands::rollback(config, output).await
        }
    }
}
