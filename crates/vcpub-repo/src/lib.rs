//! Versioned repository access for vcpub
//!
//! Defines the minimal set of repository primitives the publisher needs
//! (path kinds, directory listings, file reads, commit editors) and the
//! transports that provide them.

pub mod access;
pub mod connector;
pub mod error;
pub mod local;
pub mod location;
pub mod memory;
pub mod paths;
pub mod revision;

pub use access::{CommitEditor, RepositoryCommitter, RepositoryReader};
pub use connector::{ConnectionParams, Connector, ConnectorRegistry, Credentials};
pub use error::{Error, Result};
pub use local::{LocalConnector, LocalRepository};
pub use location::RepositoryUrl;
pub use memory::{MemoryConnector, MemoryRepository};
pub use revision::{Author, CommitInfo, DirEntry, NodeKind, Revision};
