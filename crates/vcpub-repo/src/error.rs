//! Error types for vcpub-repo

use crate::revision::{NodeKind, Revision};

/// Result type for vcpub-repo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a repository
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("No transport registered for scheme '{scheme}'")]
    UnsupportedScheme { scheme: String },

    #[error("No repository found at {url}")]
    RepositoryNotFound { url: String },

    #[error("Path '{path}' not found in revision {revision}")]
    PathNotFound { path: String, revision: Revision },

    #[error("Path '{path}' is a {found}, expected a {expected}")]
    UnexpectedKind {
        path: String,
        expected: NodeKind,
        found: NodeKind,
    },

    #[error("Path '{path}' conflicts with an existing {existing}")]
    PathConflict { path: String, existing: NodeKind },

    #[error("Revision {revision} does not exist (latest is {latest})")]
    NoSuchRevision { revision: Revision, latest: Revision },

    #[error("Commit is out of date: based on revision {base}, repository is at {latest}")]
    OutOfDate { base: Revision, latest: Revision },

    #[error("Transport error: {message}")]
    Transport { message: String },
}
