//! Publish transactions and artifact retrieval for vcpub
//!
//! This crate sits between the caller (a build tool or the `vcpub` CLI) and
//! the repository transports of `vcpub-repo`:
//!
//! - **Path resolution**: splitting destinations into root, folder and file
//! - **Put operations**: eager snapshots of the files to publish
//! - **Publish transactions**: one atomic revision per batch, with optional
//!   binary diff against an anchor folder
//! - **Reads**: get, list and resource probing through cached connections
//!
//! # Architecture
//!
//! ```text
//!                 vcpub-cli
//!                     |
//!                 vcpub-core
//!                     |
//!            +--------+--------+
//!            |                 |
//!        vcpub-fs          vcpub-repo
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vcpub_core::{ArtifactRepository, ModuleRevision, RepositoryConfig};
//!
//! fn publish(jar: &std::path::Path) -> vcpub_core::Result<()> {
//!     let mut repo = ArtifactRepository::new(RepositoryConfig::new("file:///srv/artifacts"))?;
//!     repo.begin_publish_transaction(&ModuleRevision::new("acme", "widgets", "1.0"))?;
//!     repo.put(jar, "acme/widgets/1.0/widgets.jar", false)?;
//!     repo.commit_publish_transaction()?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod module;
pub mod path;
pub mod put;
pub mod repository;
pub mod resource;
pub mod transaction;

pub use cache::{ConnectionCache, ResourceCache};
pub use config::{BinaryDiffConfig, DEFAULT_ANCHOR_FOLDER, RepositoryConfig};
pub use error::{Error, Result};
pub use events::{TransferEvent, TransferKind, TransferListener};
pub use module::ModuleRevision;
pub use path::{PathResolver, ResolvedPath};
pub use put::PutOperation;
pub use repository::ArtifactRepository;
pub use resource::Resource;
pub use transaction::{PublishTransaction, TransactionOptions, TransactionState};
