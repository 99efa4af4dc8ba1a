//! Info command implementation

use colored::Colorize;
use vcpub_core::ArtifactRepository;

use crate::error::Result;

pub fn run_info(repo: &ArtifactRepository, path: &str) -> Result<()> {
    let resource = repo.resolve_resource(path);
    println!("{}: {}", "Location".bold(), resource.location);
    if !resource.exists {
        println!("{}: {}", "Exists".bold(), "no".red());
        return Ok(());
    }
    println!("{}: {}", "Exists".bold(), "yes".green());
    println!("{}: {} bytes", "Size".bold(), resource.size);
    if let Some(modified) = resource.last_modified {
        println!("{}: {}", "Modified".bold(), modified.to_rfc3339());
    }
    Ok(())
}
