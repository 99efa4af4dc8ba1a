//! [`TestRepo`]: a bare local repository in a temporary directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vcpub_repo::{
    ConnectionParams, Connector, Credentials, LocalConnector, LocalRepository, NodeKind,
    RepositoryReader, RepositoryUrl, Revision,
};

/// A freshly initialized local repository that is removed on drop.
pub struct TestRepo {
    temp_dir: TempDir,
    url: RepositoryUrl,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    /// Initialize an empty repository (revision 0) under a new temp dir.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let url = LocalRepository::init(&temp_dir.path().join("repo"))
            .expect("TestRepo::new: failed to init local repository");
        Self { temp_dir, url }
    }

    /// Directory holding the repository.
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().join("repo")
    }

    /// Scratch directory next to the repository, for sources and downloads.
    pub fn scratch(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Root URL, always with a trailing `/`.
    pub fn url(&self) -> RepositoryUrl {
        self.url.as_directory()
    }

    /// Root URL as a string, e.g. `file:///tmp/.tmpXYZ/repo/`.
    pub fn url_string(&self) -> String {
        self.url().to_string()
    }

    /// A fresh reader on the repository.
    pub fn reader(&self) -> std::sync::Arc<dyn RepositoryReader> {
        LocalConnector
            .open_reader(&ConnectionParams::new(self.url(), Credentials::default()))
            .unwrap()
    }

    pub fn latest_revision(&self) -> Revision {
        self.reader().latest_revision().unwrap()
    }

    /// Content of `path` in the latest revision.
    pub fn read(&self, path: &str) -> Vec<u8> {
        self.reader().read_bytes(path, None).unwrap()
    }

    pub fn kind(&self, path: &str) -> NodeKind {
        self.reader().check_path(path, None).unwrap()
    }

    /// Assert `path` is a file holding `expected` in the latest revision.
    pub fn assert_file(&self, path: &str, expected: &[u8]) {
        assert_eq!(
            self.kind(path),
            NodeKind::File,
            "Expected '{path}' to be a file in {}",
            self.url
        );
        assert_eq!(self.read(path), expected, "Unexpected content in '{path}'");
    }

    pub fn assert_missing(&self, path: &str) {
        assert_eq!(
            self.kind(path),
            NodeKind::None,
            "Expected '{path}' to be absent"
        );
    }
}
