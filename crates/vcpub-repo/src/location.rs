//! Repository URLs
//!
//! A `RepositoryUrl` is an absolute URL (`file:///srv/repo`,
//! `https://svn.example.com/repo`, `svn+ssh://host/repo`) whose path is kept
//! both in encoded form and percent-decoded for path arithmetic.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryUrl {
    url: Url,
    path: String,
}

impl RepositoryUrl {
    /// Parse an absolute, percent-encoded URL.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input).map_err(|e| Error::InvalidUrl {
            url: input.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(url)
    }

    /// Build a `file://` URL for a local directory.
    pub fn from_file_path(path: &Path) -> Result<Self> {
        let url = Url::from_file_path(path).map_err(|()| Error::InvalidUrl {
            url: path.display().to_string(),
            reason: "local repository paths must be absolute".into(),
        })?;
        Self::from_url(url)
    }

    fn from_url(url: Url) -> Result<Self> {
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl {
                url: url.to_string(),
                reason: "URL has no hierarchical path".into(),
            });
        }
        let path = percent_decode_str(url.path())
            .decode_utf8()
            .map_err(|e| Error::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .into_owned();
        Ok(Self { url, path })
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// Percent-decoded path component.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Local filesystem path of a `file://` URL.
    pub fn to_file_path(&self) -> Result<PathBuf> {
        if self.scheme() != "file" {
            return Err(Error::UnsupportedScheme {
                scheme: self.scheme().to_string(),
            });
        }
        self.url.to_file_path().map_err(|()| Error::InvalidUrl {
            url: self.url.to_string(),
            reason: "not a local file path".into(),
        })
    }

    /// Append a decoded relative path to this URL's path.
    pub fn join_path(&self, relative: &str) -> Result<Self> {
        let joined = format!(
            "{}/{}",
            self.path.trim_end_matches('/'),
            relative.trim_start_matches('/')
        );
        let mut url = self.url.clone();
        url.set_path(&joined);
        Self::from_url(url)
    }

    /// Copy of this URL with a trailing `/` on its path.
    pub fn as_directory(&self) -> Self {
        if self.path.ends_with('/') {
            return self.clone();
        }
        let mut url = self.url.clone();
        url.set_path(&format!("{}/", self.url.path()));
        Self {
            url,
            path: format!("{}/", self.path),
        }
    }
}

impl fmt::Display for RepositoryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

impl FromStr for RepositoryUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
