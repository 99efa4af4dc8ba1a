//! Resolving the repository configuration for a command
//!
//! The config file named by `--config` is read when present; `--root`,
//! `--revision` and `--no-binary-diff` override it.

use std::path::Path;

use vcpub_core::{ArtifactRepository, RepositoryConfig};
use vcpub_repo::RepositoryUrl;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Turn a `--root` value into a URL; anything without a scheme is a local directory.
pub fn root_url(root: &str) -> Result<String> {
    if root.contains("://") {
        return Ok(RepositoryUrl::parse(root)?.as_directory().to_string());
    }
    let path = Path::new(root);
    let absolute = if path.exists() {
        path.canonicalize()?
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(RepositoryUrl::from_file_path(&absolute)?
        .as_directory()
        .to_string())
}

/// Build the effective configuration from the config file and flags.
pub fn load_config(cli: &Cli) -> Result<RepositoryConfig> {
    let mut config = if cli.config.exists() {
        let mut config = RepositoryConfig::load(&cli.config)?;
        if let Some(root) = &cli.root {
            config.repository_root = root_url(root)?;
        }
        config
    } else {
        let root = cli.root.as_deref().ok_or_else(|| {
            CliError::user(format!(
                "No configuration found at {}; pass --root or create one with 'vcpub init --save-config'",
                cli.config.display()
            ))
        })?;
        RepositoryConfig::new(root_url(root)?)
    };

    if cli.revision.is_some() {
        config.retrieve_revision = cli.revision;
    }
    if cli.no_binary_diff {
        config.binary_diff.enabled = false;
    }
    config.validate()?;
    tracing::debug!(root = %config.repository_root, "Resolved configuration");
    Ok(config)
}

pub fn open_repository(cli: &Cli) -> Result<ArtifactRepository> {
    Ok(ArtifactRepository::new(load_config(cli)?)?)
}
