//! Revisions, node kinds and directory entries

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable, monotonically numbered snapshot of the repository tree.
///
/// Revision 0 is the empty repository; every commit adds exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    pub const INITIAL: Revision = Revision(0);

    pub fn new(number: u64) -> Self {
        Self(number)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl From<u64> for Revision {
    fn from(number: u64) -> Self {
        Self(number)
    }
}

/// What a path names in a given revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    None,
    File,
    Folder,
}

impl NodeKind {
    pub fn exists(self) -> bool {
        self != NodeKind::None
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::None => "missing node",
            NodeKind::File => "file",
            NodeKind::Folder => "folder",
        };
        f.write_str(name)
    }
}

/// One child of a folder, or the node itself when returned by `info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: NodeKind,
    /// Content length in bytes; zero for folders
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Identity recorded on every revision a commit editor produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let email = format!("{name}@localhost");
        Self { name, email }
    }
}

impl Default for Author {
    fn default() -> Self {
        Self::new("vcpub")
    }
}

/// Outcome of a finalized commit editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub revision: Revision,
    /// Number of editor operations contained in the revision
    pub changes: usize,
}
