//! In-memory repositories for tests that do not need git.

use std::sync::Arc;

use vcpub_repo::{ConnectorRegistry, MemoryConnector, MemoryRepository, RepositoryUrl};

/// Root of every repository created here.
pub const MEMORY_ROOT: &str = "https://svn.example.com/repo/";

/// An empty in-memory repository rooted at [`MEMORY_ROOT`].
pub fn memory_repository() -> MemoryRepository {
    MemoryRepository::new(RepositoryUrl::parse(MEMORY_ROOT).unwrap())
}

/// A registry routing `https` to `repository`.
pub fn memory_registry(repository: &MemoryRepository) -> Arc<ConnectorRegistry> {
    let mut registry = ConnectorRegistry::new();
    registry.register("https", Arc::new(MemoryConnector::new(repository.clone())));
    Arc::new(registry)
}
