//! [`SourceDir`]: local artifact files to publish.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary directory of source files.
pub struct SourceDir {
    temp_dir: TempDir,
}

impl Default for SourceDir {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name` (creating parent dirs) and return its path.
    pub fn file(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// A file of `len` pseudo-random but deterministic bytes.
    pub fn binary(&self, name: &str, len: usize, seed: u8) -> PathBuf {
        let content: Vec<u8> = (0..len)
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
            .collect();
        self.file(name, content)
    }
}
