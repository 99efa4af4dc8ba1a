//! Init command implementation

use std::path::Path;

use colored::Colorize;
use vcpub_core::RepositoryConfig;
use vcpub_repo::LocalRepository;

use crate::context::root_url;
use crate::error::{CliError, Result};

/// Create an empty local repository in `dir`, optionally writing `config_path`.
pub fn run_init(dir: &Path, save_config: Option<&Path>) -> Result<()> {
    if dir.exists() && dir.read_dir()?.next().is_some() {
        return Err(CliError::user(format!(
            "Directory '{}' is not empty",
            dir.display()
        )));
    }

    println!(
        "{} Creating repository in {}...",
        "=>".blue().bold(),
        dir.display().to_string().cyan()
    );
    std::fs::create_dir_all(dir)?;
    LocalRepository::init(&dir.canonicalize()?)?;
    let url = root_url(&dir.to_string_lossy())?;

    if let Some(config_path) = save_config {
        RepositoryConfig::new(url.clone()).save(config_path)?;
        println!("   Config: {}", config_path.display().to_string().yellow());
    }

    println!("{} Repository initialized at {}", "OK".green().bold(), url);
    Ok(())
}
