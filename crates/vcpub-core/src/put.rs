//! A single scheduled file write

use std::path::{Path, PathBuf};

use bytes::Bytes;
use vcpub_fs::{checksum::compute_checksum, io::read_snapshot};

use crate::{
    Error, Result,
    path::{PathResolver, ResolvedPath},
};

/// One file to be written by a publish transaction.
///
/// The source content is captured when the operation is created, so the
/// source file may be moved or deleted before the transaction commits.
#[derive(Debug, Clone)]
pub struct PutOperation {
    source: PathBuf,
    destination: String,
    content: Bytes,
    resolved: ResolvedPath,
    overwrite: bool,
}

impl PutOperation {
    /// Snapshot `source` and resolve `destination` against `explicit_root`.
    ///
    /// Both a missing or unreadable source and an invalid destination are
    /// reported as [`Error::Io`].
    pub fn create(
        source: &Path,
        destination: &str,
        overwrite: bool,
        explicit_root: Option<&str>,
    ) -> Result<Self> {
        let content = read_snapshot(source).map_err(|e| Error::Io {
            message: format!("Cannot read source file {}: {e}", source.display()),
            source: Box::new(e),
        })?;
        let resolved = PathResolver::resolve(destination, explicit_root).map_err(|e| Error::Io {
            message: e.to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            source: source.to_path_buf(),
            destination: destination.to_string(),
            content: Bytes::from(content),
            resolved,
            overwrite,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Destination exactly as it was requested.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn resolved(&self) -> &ResolvedPath {
        &self.resolved
    }

    /// Folder below the root, without leading separator.
    pub fn folder_path(&self) -> &str {
        self.resolved.folder_path()
    }

    pub fn file_name(&self) -> &str {
        &self.resolved.file_name
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    pub fn checksum(&self) -> String {
        compute_checksum(&self.content)
    }
}
