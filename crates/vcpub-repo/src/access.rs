//! Repository access traits
//!
//! Reading and committing are separate capabilities: a publish transaction
//! probes the repository through a reader while a committer owns the commit
//! editor, so probing never touches in-flight editor state.

use std::io::Write;

use bytes::Bytes;

use crate::{
    Result,
    location::RepositoryUrl,
    revision::{Author, CommitInfo, DirEntry, NodeKind, Revision},
};

/// Read-only view of a repository.
///
/// Paths are relative to the repository root. `None` as revision means the
/// latest revision at the time of the call.
pub trait RepositoryReader: Send + Sync {
    /// URL of the repository root
    fn root(&self) -> &RepositoryUrl;

    fn latest_revision(&self) -> Result<Revision>;

    fn check_path(&self, path: &str, revision: Option<Revision>) -> Result<NodeKind>;

    /// Immediate children of a folder, in the order the store enumerates them
    fn dir_entries(&self, path: &str, revision: Option<Revision>) -> Result<Vec<DirEntry>>;

    /// Metadata for a single node, `None` if the path does not exist
    fn info(&self, path: &str, revision: Option<Revision>) -> Result<Option<DirEntry>>;

    /// Stream a file's content into `out`, returning the byte count
    fn read_file(&self, path: &str, revision: Option<Revision>, out: &mut dyn Write)
    -> Result<u64>;

    fn read_bytes(&self, path: &str, revision: Option<Revision>) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.read_file(path, revision, &mut buffer)?;
        Ok(buffer)
    }
}

/// Capability to open commit editors against a repository.
pub trait RepositoryCommitter: Send + Sync {
    fn root(&self) -> &RepositoryUrl;

    /// Open an editor whose changes land in one new revision on finalize
    fn open_commit_editor(&self, message: &str, author: &Author) -> Result<Box<dyn CommitEditor>>;
}

/// Session batching path-level changes into a single atomic revision.
///
/// Nothing is visible to readers until [`CommitEditor::finalize`] succeeds.
/// Dropping an editor without finalizing has the same effect as
/// [`CommitEditor::discard`].
pub trait CommitEditor: Send {
    /// Create a folder; its parent must exist or be created earlier in this editor
    fn ensure_folder(&mut self, path: &str) -> Result<()>;

    /// Add a file, or replace the content of an existing one
    fn add_file(&mut self, path: &str, content: Bytes) -> Result<()>;

    /// Add or replace `to_path` with the content of `from_path` at `from_revision`
    /// without transmitting the content again
    fn copy_file(&mut self, from_path: &str, from_revision: Revision, to_path: &str)
    -> Result<()>;

    fn finalize(self: Box<Self>) -> Result<CommitInfo>;

    fn discard(self: Box<Self>) -> Result<()>;
}
