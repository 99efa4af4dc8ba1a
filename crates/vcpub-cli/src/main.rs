//! vcpub CLI
//!
//! Publishes build artifacts into a versioned repository and retrieves them.

mod cli;
mod commands;
mod context;
mod error;

use std::io::IsTerminal;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use vcpub_core::ModuleRevision;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Target of the start-up banner, shown at the default log level.
const BANNER_TARGET: &str = "vcpub::banner";

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("warn,{BANNER_TARGET}=info")))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
    tracing::info!(target: BANNER_TARGET, version = env!("CARGO_PKG_VERSION"), "vcpub");
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Init { dir, save_config } => {
            commands::run_init(dir, save_config.then_some(cli.config.as_path()))
        }
        Commands::Publish {
            org,
            module,
            rev,
            overwrite,
            message,
            artifacts,
        } => {
            let mut repo = context::open_repository(&cli)?;
            let module = ModuleRevision::new(org, module, rev);
            commands::run_publish(&mut repo, &module, message.as_deref(), artifacts, *overwrite)
        }
        Commands::Get {
            source,
            destination,
        } => commands::run_get(&context::open_repository(&cli)?, source, destination),
        Commands::List { folder } => commands::run_list(&context::open_repository(&cli)?, folder),
        Commands::Info { path } => commands::run_info(&context::open_repository(&cli)?, path),
    }
}
