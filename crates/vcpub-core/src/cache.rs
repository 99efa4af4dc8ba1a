//! Connection and resource caches
//!
//! Both are plain mutex-guarded maps owned by whoever creates them; nothing
//! here is process-global.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use vcpub_repo::{ConnectionParams, Connector, RepositoryReader};

use crate::{Result, resource::Resource};

/// Read handles keyed by the parameters they were opened with.
#[derive(Default)]
pub struct ConnectionCache {
    readers: Mutex<HashMap<ConnectionParams, Arc<dyn RepositoryReader>>>,
}

impl ConnectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached reader for `params`, opening one through `connector`
    /// on a miss.
    pub fn reader(
        &self,
        params: &ConnectionParams,
        connector: &dyn Connector,
    ) -> Result<Arc<dyn RepositoryReader>> {
        let mut readers = self.readers.lock();
        if let Some(reader) = readers.get(params) {
            tracing::trace!(url = %params.url, "Reusing cached connection");
            return Ok(Arc::clone(reader));
        }
        let reader = connector.open_reader(params)?;
        tracing::debug!(url = %params.url, "Opened read connection");
        readers.insert(params.clone(), Arc::clone(&reader));
        Ok(reader)
    }

    pub fn len(&self) -> usize {
        self.readers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.lock().is_empty()
    }

    pub fn clear(&self) {
        self.readers.lock().clear();
    }
}

impl std::fmt::Debug for ConnectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCache")
            .field("connections", &self.len())
            .finish()
    }
}

/// Resource descriptors keyed by repository-relative path.
#[derive(Debug, Default)]
pub struct ResourceCache {
    resources: Mutex<HashMap<String, Resource>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Resource> {
        self.resources.lock().get(path).cloned()
    }

    pub fn insert(&self, path: impl Into<String>, resource: Resource) {
        self.resources.lock().insert(path.into(), resource);
    }

    /// Forget every listed path.
    pub fn invalidate<'a>(&self, paths: impl IntoIterator<Item = &'a str>) {
        let mut resources = self.resources.lock();
        for path in paths {
            resources.remove(path);
        }
    }

    pub fn len(&self) -> usize {
        self.resources.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.lock().is_empty()
    }
}
