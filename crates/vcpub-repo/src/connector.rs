//! Connection parameters and the transport registry

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    access::{RepositoryCommitter, RepositoryReader},
    local::LocalConnector,
    location::RepositoryUrl,
};

/// The default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Schemes a repository URL may use. Only `file` ships with a transport.
pub const KNOWN_SCHEMES: &[&str] = &["file", "http", "https", "svn", "svn+ssh"];

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

/// Authentication settings handed to transports.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Private key for SSH authentication
    #[serde(default)]
    pub key_file: Option<PathBuf>,
    #[serde(default)]
    pub passphrase: Option<String>,
    /// Port the SSH server listens on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client certificate for TLS authentication
    #[serde(default)]
    pub cert_file: Option<PathBuf>,
    /// Whether transports may store credentials in a global cache
    #[serde(default)]
    pub storage_allowed: bool,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            key_file: None,
            passphrase: None,
            port: DEFAULT_SSH_PORT,
            cert_file: None,
            storage_allowed: false,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("key_file", &self.key_file)
            .field("passphrase", &redact(&self.passphrase))
            .field("port", &self.port)
            .field("cert_file", &self.cert_file)
            .field("storage_allowed", &self.storage_allowed)
            .finish()
    }
}

/// Everything needed to open a connection; also the connection cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionParams {
    pub url: RepositoryUrl,
    pub credentials: Credentials,
}

impl ConnectionParams {
    pub fn new(url: RepositoryUrl, credentials: Credentials) -> Self {
        Self { url, credentials }
    }
}

/// Factory for the two repository capabilities.
///
/// Every call opens a fresh connection; callers decide what to cache.
pub trait Connector: Send + Sync {
    fn open_reader(&self, params: &ConnectionParams) -> Result<Arc<dyn RepositoryReader>>;

    fn open_committer(&self, params: &ConnectionParams) -> Result<Box<dyn RepositoryCommitter>>;
}

/// Dispatches connections to the transport registered for the URL scheme.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the local filesystem transport for `file://` URLs.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("file", Arc::new(LocalConnector));
        registry
    }

    /// Register (or replace) the transport for a scheme.
    pub fn register(&mut self, scheme: &str, connector: Arc<dyn Connector>) {
        if !KNOWN_SCHEMES.contains(&scheme) {
            tracing::debug!(scheme, "Registering transport for non-standard scheme");
        }
        self.connectors.insert(scheme.to_ascii_lowercase(), connector);
    }

    pub fn supports(&self, scheme: &str) -> bool {
        self.connectors.contains_key(&scheme.to_ascii_lowercase())
    }

    fn connector_for(&self, url: &RepositoryUrl) -> Result<&Arc<dyn Connector>> {
        self.connectors
            .get(url.scheme())
            .ok_or_else(|| Error::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            })
    }
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<_> = self.connectors.keys().collect();
        schemes.sort();
        f.debug_struct("ConnectorRegistry")
            .field("schemes", &schemes)
            .finish()
    }
}

impl Connector for ConnectorRegistry {
    fn open_reader(&self, params: &ConnectionParams) -> Result<Arc<dyn RepositoryReader>> {
        self.connector_for(&params.url)?.open_reader(params)
    }

    fn open_committer(&self, params: &ConnectionParams) -> Result<Box<dyn RepositoryCommitter>> {
        self.connector_for(&params.url)?.open_committer(params)
    }
}
