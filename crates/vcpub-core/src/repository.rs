//! Caller-facing artifact repository
//!
//! [`ArtifactRepository`] is the surface a build tool talks to: a publish
//! transaction API plus non-transactional reads. Reads go through a cached
//! connection and may run before, during or after a publish.

use std::path::Path;
use std::sync::Arc;

use vcpub_fs::{RobustnessConfig, io::write_atomic};
use vcpub_repo::{
    CommitInfo, ConnectionParams, Connector, ConnectorRegistry, NodeKind, RepositoryReader,
    RepositoryUrl,
};

use crate::{
    Error, Result,
    cache::{ConnectionCache, ResourceCache},
    config::RepositoryConfig,
    events::{TransferEvent, TransferKind, TransferListener},
    module::ModuleRevision,
    path::PathResolver,
    resource::Resource,
    transaction::{PublishTransaction, TransactionOptions},
};

/// A repository location resolved for reading.
struct Located {
    reader: Arc<dyn RepositoryReader>,
    url: RepositoryUrl,
    path: String,
}

pub struct ArtifactRepository {
    config: RepositoryConfig,
    params: ConnectionParams,
    connector: Arc<dyn Connector>,
    connections: Arc<ConnectionCache>,
    resources: ResourceCache,
    listeners: Vec<Arc<dyn TransferListener>>,
    transaction: Option<PublishTransaction>,
}

impl std::fmt::Debug for ArtifactRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactRepository")
            .field("root", &self.params.url)
            .field("transaction", &self.transaction)
            .finish()
    }
}

impl ArtifactRepository {
    /// Create a repository using the built-in transports.
    pub fn new(config: RepositoryConfig) -> Result<Self> {
        Self::with_connector(config, Arc::new(ConnectorRegistry::with_defaults()))
    }

    pub fn with_connector(config: RepositoryConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;
        let params = config.connection_params()?;
        Ok(Self {
            config,
            params,
            connector,
            connections: Arc::new(ConnectionCache::new()),
            resources: ResourceCache::new(),
            listeners: Vec::new(),
            transaction: None,
        })
    }

    /// Share read connections with other repositories through `cache`.
    pub fn with_connection_cache(mut self, cache: Arc<ConnectionCache>) -> Self {
        self.connections = cache;
        self
    }

    pub fn add_listener(&mut self, listener: Arc<dyn TransferListener>) {
        self.listeners.push(listener);
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Root URL, always ending in `/`.
    pub fn root(&self) -> &RepositoryUrl {
        &self.params.url
    }

    pub fn transaction(&self) -> Option<&PublishTransaction> {
        self.transaction.as_ref()
    }

    fn notify(&self, event: TransferEvent) {
        for listener in &self.listeners {
            listener.transfer_event(&event);
        }
    }

    fn reader(&self) -> Result<Arc<dyn RepositoryReader>> {
        self.connections.reader(&self.params, self.connector.as_ref())
    }

    /// Absolute URL of `location`: full URLs are taken as-is, anything else is
    /// relative to the configured root.
    fn url_of(&self, location: &str) -> Result<RepositoryUrl> {
        if location.contains("://") {
            return Ok(RepositoryUrl::parse(location)?);
        }
        Ok(self.params.url.join_path(location)?)
    }

    fn locate(&self, location: &str) -> Result<Located> {
        let reader = self.reader()?;
        let url = self.url_of(location)?;
        let path = PathResolver::relative_to(url.path(), reader.root().path())?;
        Ok(Located { reader, url, path })
    }

    // Publishing

    pub fn begin_publish_transaction(&mut self, module: &ModuleRevision) -> Result<()> {
        self.begin_publish_transaction_with_message(module, &module.commit_message())
    }

    /// Begin publishing `module`, labelling the resulting revision `message`.
    pub fn begin_publish_transaction_with_message(
        &mut self,
        module: &ModuleRevision,
        message: &str,
    ) -> Result<()> {
        if let Some(open) = self.transaction.as_ref().filter(|t| !t.state().is_terminal()) {
            return Err(Error::illegal_state(format!(
                "a publish transaction for {} is already open",
                open.module()
            )));
        }
        let options = TransactionOptions {
            message: message.to_string(),
            author: self.config.author(),
            binary_diff: self.config.binary_diff.clone(),
            explicit_root: self.config.repository_path.clone(),
        };
        self.transaction = Some(PublishTransaction::begin(
            Arc::clone(&self.connector),
            self.params.clone(),
            module.clone(),
            options,
        )?);
        Ok(())
    }

    fn open_transaction(&mut self) -> Result<&mut PublishTransaction> {
        self.transaction
            .as_mut()
            .ok_or_else(|| Error::illegal_state("transaction not initialised"))
    }

    /// Schedule `source` for publication at `destination`.
    pub fn put(&mut self, source: &Path, destination: &str, overwrite: bool) -> Result<()> {
        if self.transaction.is_none() {
            return Err(Error::illegal_state("transaction not initialised"));
        }
        let url = self.url_of(destination)?;
        self.notify(TransferEvent::Initiated {
            kind: TransferKind::Put,
            location: url.to_string(),
        });
        self.open_transaction()?
            .add_put_operation(source, url.as_str(), overwrite)?;
        Ok(())
    }

    /// Commit every scheduled put as one revision.
    pub fn commit_publish_transaction(&mut self) -> Result<Option<CommitInfo>> {
        let transaction = self.open_transaction()?;
        let info = transaction.commit()?;
        let written: Vec<String> = transaction.committed_paths().to_vec();
        self.resources.invalidate(written.iter().map(String::as_str));
        Ok(info)
    }

    /// Discard the current transaction; a no-op when there is none.
    pub fn abort_publish_transaction(&mut self) {
        match self.transaction.as_mut() {
            Some(transaction) => transaction.abort(),
            None => tracing::debug!("No publish transaction to abort"),
        }
    }

    // Reading

    /// Copy the file at `source` to `destination`, returning its size.
    pub fn get(&self, source: &str, destination: &Path) -> Result<u64> {
        let location = self.url_of(source)?.to_string();
        self.notify(TransferEvent::Initiated {
            kind: TransferKind::Get,
            location: location.clone(),
        });
        match self.retrieve(source, destination) {
            Ok(bytes) => {
                self.notify(TransferEvent::Completed {
                    kind: TransferKind::Get,
                    location,
                    bytes,
                });
                Ok(bytes)
            }
            Err(e) => {
                self.notify(TransferEvent::Failed {
                    kind: TransferKind::Get,
                    location,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn retrieve(&self, source: &str, destination: &Path) -> Result<u64> {
        let Located { reader, url, path } = self.locate(source)?;
        let revision = self.config.retrieve_revision();
        if reader.check_path(&path, revision)? != NodeKind::File {
            return Err(Error::NotAFile {
                path: url.to_string(),
            });
        }
        let content = reader.read_bytes(&path, revision)?;
        write_atomic(destination, &content, RobustnessConfig::default()).map_err(|source| {
            Error::Store {
                path: destination.to_path_buf(),
                source,
            }
        })?;
        tracing::info!(
            source = %url,
            destination = %destination.display(),
            bytes = content.len(),
            "Retrieved artifact"
        );
        Ok(content.len() as u64)
    }

    /// Names of the immediate children of the folder at `source`.
    pub fn list(&self, source: &str) -> Result<Vec<String>> {
        let Located { reader, url, path } = self.locate(source)?;
        let revision = self.config.retrieve_revision();
        if reader.check_path(&path, revision)? != NodeKind::Folder {
            return Err(Error::NotAFolder {
                path: url.to_string(),
            });
        }
        Ok(reader
            .dir_entries(&path, revision)?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }

    /// Descriptor for `source`, served from the resource cache when possible.
    pub fn get_resource(&self, source: &str) -> Resource {
        let location = match self.locate(source) {
            Ok(location) => location,
            Err(e) => {
                tracing::warn!(source, error = %e, "Failed to locate resource");
                return Resource::missing(self.location_of(source));
            }
        };
        if let Some(resource) = self.resources.get(&location.path) {
            tracing::debug!(path = %location.path, "Resource cache hit");
            return resource;
        }
        match self.describe(&location) {
            Ok(resource) => {
                self.resources.insert(location.path, resource.clone());
                resource
            }
            Err(e) => {
                tracing::warn!(source, error = %e, "Failed to resolve resource");
                Resource::missing(location.url.to_string())
            }
        }
    }

    /// Uncached descriptor for `source`; any failure yields a missing resource.
    pub fn resolve_resource(&self, source: &str) -> Resource {
        match self.locate(source).and_then(|location| self.describe(&location)) {
            Ok(resource) => resource,
            Err(e) => {
                tracing::warn!(source, error = %e, "Failed to resolve resource");
                Resource::missing(self.location_of(source))
            }
        }
    }

    /// Absolute URL of `source` as a string, or `source` itself when it does
    /// not form a valid URL.
    fn location_of(&self, source: &str) -> String {
        self.url_of(source)
            .map_or_else(|_| source.to_string(), |url| url.to_string())
    }

    fn describe(&self, location: &Located) -> Result<Resource> {
        let info = location
            .reader
            .info(&location.path, self.config.retrieve_revision())?;
        Ok(match info {
            Some(entry) => Resource {
                location: location.url.to_string(),
                exists: true,
                last_modified: entry.last_modified,
                size: entry.size,
            },
            None => Resource::missing(location.url.to_string()),
        })
    }
}
