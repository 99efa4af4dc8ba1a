//! List command implementation

use vcpub_core::ArtifactRepository;

use crate::error::Result;

/// Print the children of `folder`, one per line.
pub fn run_list(repo: &ArtifactRepository, folder: &str) -> Result<()> {
    for name in repo.list(folder)? {
        println!("{name}");
    }
    Ok(())
}
