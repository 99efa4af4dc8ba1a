//! Publish command implementation

use std::path::PathBuf;

use colored::Colorize;
use vcpub_core::{ArtifactRepository, ModuleRevision};

use crate::error::{CliError, Result};

/// One `<file>=<destination>` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub source: PathBuf,
    pub destination: String,
}

impl ArtifactSpec {
    pub fn parse(arg: &str) -> Result<Self> {
        match arg.split_once('=') {
            Some((source, destination)) if !source.is_empty() && !destination.is_empty() => {
                Ok(Self {
                    source: PathBuf::from(source),
                    destination: destination.to_string(),
                })
            }
            _ => Err(CliError::user(format!(
                "Invalid artifact '{arg}': expected <file>=<destination>"
            ))),
        }
    }
}

/// Publish every artifact as a single revision.
///
/// Any failure aborts the transaction so nothing is committed.
pub fn run_publish(
    repo: &mut ArtifactRepository,
    module: &ModuleRevision,
    message: Option<&str>,
    artifacts: &[String],
    overwrite: bool,
) -> Result<()> {
    let artifacts = artifacts
        .iter()
        .map(|arg| ArtifactSpec::parse(arg))
        .collect::<Result<Vec<_>>>()?;

    println!(
        "{} Publishing {} to {}",
        "=>".blue().bold(),
        module.to_string().cyan(),
        repo.root()
    );

    match message {
        Some(message) => repo.begin_publish_transaction_with_message(module, message)?,
        None => repo.begin_publish_transaction(module)?,
    }

    let outcome = publish_all(repo, &artifacts, overwrite);
    if outcome.is_err() {
        repo.abort_publish_transaction();
    }
    outcome
}

fn publish_all(repo: &mut ArtifactRepository, artifacts: &[ArtifactSpec], overwrite: bool) -> Result<()> {
    for artifact in artifacts {
        repo.put(&artifact.source, &artifact.destination, overwrite)?;
        println!(
            "   {} {}",
            artifact.source.display().to_string().yellow(),
            artifact.destination
        );
    }

    match repo.commit_publish_transaction()? {
        Some(info) => println!(
            "{} Committed revision {} ({} files)",
            "OK".green().bold(),
            info.revision.get(),
            artifacts.len()
        ),
        None => println!("{} Nothing to publish", "OK".green().bold()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_artifact_spec() {
        let spec = ArtifactSpec::parse("target/a.jar=org/a/1.0/a.jar").unwrap();
        assert_eq!(spec.source, PathBuf::from("target/a.jar"));
        assert_eq!(spec.destination, "org/a/1.0/a.jar");
    }

    #[test]
    fn test_parse_keeps_equals_in_destination() {
        let spec = ArtifactSpec::parse("a.jar=org/a=b/a.jar").unwrap();
        assert_eq!(spec.destination, "org/a=b/a.jar");
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert!(ArtifactSpec::parse("a.jar").is_err());
        assert!(ArtifactSpec::parse("=dest").is_err());
        assert!(ArtifactSpec::parse("a.jar=").is_err());
    }
}
