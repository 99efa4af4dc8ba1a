//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// vcpub - Publish build artifacts into a versioned repository
#[derive(Parser, Debug)]
#[command(name = "vcpub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true, default_value = "vcpub.toml", env = "VCPUB_CONFIG")]
    pub config: PathBuf,

    /// Repository root URL or local directory, overriding the config file
    #[arg(long, global = true, env = "VCPUB_ROOT")]
    pub root: Option<String>,

    /// Read from this revision instead of the latest
    #[arg(long, global = true)]
    pub revision: Option<u64>,

    /// Always transmit full content instead of referencing the anchor folder
    #[arg(long, global = true)]
    pub no_binary_diff: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create an empty local repository
    ///
    /// Examples:
    ///   vcpub init ./artifacts
    ///   vcpub init ./artifacts --save-config
    Init {
        /// Directory to create the repository in
        dir: PathBuf,

        /// Write a config file pointing at the new repository
        #[arg(long)]
        save_config: bool,
    },

    /// Publish files as one revision
    ///
    /// Examples:
    ///   vcpub publish --org acme --module widgets --rev 1.0 \
    ///       target/widgets.jar=acme/widgets/1.0/widgets.jar
    Publish {
        /// Organisation of the module
        #[arg(long)]
        org: String,

        /// Module name
        #[arg(long)]
        module: String,

        /// Module revision
        #[arg(long)]
        rev: String,

        /// Replace files that already exist
        #[arg(long)]
        overwrite: bool,

        /// Commit message (defaults to "Publishing <org>/<module> [<rev>]")
        #[arg(short, long)]
        message: Option<String>,

        /// Artifacts as <file>=<destination>
        #[arg(required = true, value_name = "FILE=DEST")]
        artifacts: Vec<String>,
    },

    /// Download a file
    Get {
        /// Repository path or URL of the file
        source: String,

        /// Local destination file
        destination: PathBuf,
    },

    /// List the contents of a folder
    List {
        /// Repository path or URL of the folder
        #[arg(default_value = "")]
        folder: String,
    },

    /// Show what is known about a path
    Info {
        /// Repository path or URL
        path: String,
    },
}
