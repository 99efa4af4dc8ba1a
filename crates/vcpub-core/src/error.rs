//! Error types for vcpub-core

use std::path::PathBuf;

/// Result type for vcpub-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the publisher
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Destination is malformed, names a folder, or lies outside the root
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Reading a local source file failed
    #[error("{message}")]
    Io {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Destination exists and the put did not allow replacing it
    #[error("Overwrite of existing file denied: {path}")]
    OverwriteDenied { path: String },

    /// The repository rejected the commit; nothing was applied
    #[error("Commit failed: {source}")]
    CommitFailure {
        #[source]
        source: vcpub_repo::Error,
    },

    /// Publish API used out of order
    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Not a file: {path}")]
    NotAFile { path: String },

    #[error("Not a folder: {path}")]
    NotAFolder { path: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Writing a retrieved artifact to the local filesystem failed
    #[error("Failed to store {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: vcpub_fs::Error,
    },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from vcpub-fs
    #[error(transparent)]
    Fs(#[from] vcpub_fs::Error),

    /// Repository error from vcpub-repo
    #[error(transparent)]
    Repository(#[from] vcpub_repo::Error),
}

impl Error {
    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn commit_failure(source: vcpub_repo::Error) -> Self {
        Self::CommitFailure { source }
    }

    /// Whether repeating the operation can succeed once the caller has acted.
    ///
    /// Local read failures, overwrite conflicts and rejected commits are worth
    /// retrying; API misuse and malformed input never are.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Io { .. } | Error::OverwriteDenied { .. } | Error::CommitFailure { .. }
        )
    }
}
