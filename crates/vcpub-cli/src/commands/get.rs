//! Get command implementation

use std::path::Path;

use colored::Colorize;
use vcpub_core::ArtifactRepository;

use crate::error::Result;

pub fn run_get(repo: &ArtifactRepository, source: &str, destination: &Path) -> Result<()> {
    let bytes = repo.get(source, destination)?;
    println!(
        "{} {} -> {} ({} bytes)",
        "OK".green().bold(),
        source,
        destination.display().to_string().cyan(),
        bytes
    );
    Ok(())
}
