//! Repository configuration
//!
//! ```toml
//! repository_root = "file:///srv/artifacts/"
//! retrieve_revision = 12
//!
//! [credentials]
//! username = "builder"
//! key_file = "/home/builder/.ssh/id_ed25519"
//!
//! [binary_diff]
//! enabled = true
//! folder_name = "LATEST"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use vcpub_fs::ConfigStore;
use vcpub_repo::{Author, ConnectionParams, Credentials, RepositoryUrl, Revision};

use crate::{Error, Result};

/// Default name of the binary-diff anchor folder.
pub const DEFAULT_ANCHOR_FOLDER: &str = "LATEST";

fn default_enabled() -> bool {
    true
}

fn default_folder_name() -> String {
    DEFAULT_ANCHOR_FOLDER.to_string()
}

/// Storing unchanged content once under an anchor folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryDiffConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Folder that replaces the revision folder to form the anchor location
    #[serde(default = "default_folder_name")]
    pub folder_name: String,
}

impl Default for BinaryDiffConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            folder_name: default_folder_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// URL of the repository root
    pub repository_root: String,
    /// Path (below the URL's host) that destinations must start with
    #[serde(default)]
    pub repository_path: Option<String>,
    /// Revision served by reads; latest when absent
    #[serde(default)]
    pub retrieve_revision: Option<u64>,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub binary_diff: BinaryDiffConfig,
}

impl RepositoryConfig {
    pub fn new(repository_root: impl Into<String>) -> Self {
        Self {
            repository_root: repository_root.into(),
            repository_path: None,
            retrieve_revision: None,
            credentials: Credentials::default(),
            binary_diff: BinaryDiffConfig::default(),
        }
    }

    /// Load and validate a TOML, JSON or YAML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = ConfigStore::new().load(path)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), root = %config.repository_root, "Loaded repository config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ConfigStore::new().save(path, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.repository_root.trim().is_empty() {
            return Err(config_error("repository_root must be set"));
        }
        self.root_url()?;

        let anchor = &self.binary_diff.folder_name;
        if anchor.is_empty() {
            return Err(config_error("binary_diff.folder_name must not be empty"));
        }
        if anchor.contains('/') {
            return Err(config_error(format!(
                "binary_diff.folder_name '{anchor}' must be a single folder name"
            )));
        }
        Ok(())
    }

    /// The repository root URL, with a trailing `/`.
    pub fn root_url(&self) -> Result<RepositoryUrl> {
        RepositoryUrl::parse(self.repository_root.trim())
            .map(|url| url.as_directory())
            .map_err(|e| config_error(format!("repository_root: {e}")))
    }

    pub fn connection_params(&self) -> Result<ConnectionParams> {
        Ok(ConnectionParams::new(
            self.root_url()?,
            self.credentials.clone(),
        ))
    }

    pub fn retrieve_revision(&self) -> Option<Revision> {
        self.retrieve_revision.map(Revision::new)
    }

    /// Identity recorded on published revisions.
    pub fn author(&self) -> Author {
        self.credentials
            .username
            .as_deref()
            .map(Author::new)
            .unwrap_or_default()
    }
}

fn config_error(message: impl Into<String>) -> Error {
    Error::Config {
        message: message.into(),
    }
}
