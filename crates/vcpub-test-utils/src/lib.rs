//! Shared test utilities for the vcpub workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`repo`]: [`repo::TestRepo`], a temporary local repository
//! - [`sources`]: [`sources::SourceDir`], artifact files to publish
//! - [`memory`]: in-memory repositories at a fixed URL

pub mod memory;
pub mod repo;
pub mod sources;
