//! Snapshot reads and atomic writes with file locking

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use backoff::ExponentialBackoff;
use fs2::FileExt;

use crate::{Error, Result};

/// Retry settings for lock acquisition during atomic writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// Give up acquiring the advisory lock after this long
    pub lock_timeout: Duration,
    /// First wait between lock attempts
    pub initial_retry_interval: Duration,
    /// Upper bound for the wait between lock attempts
    pub max_retry_interval: Duration,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            initial_retry_interval: Duration::from_millis(10),
            max_retry_interval: Duration::from_millis(500),
        }
    }
}

impl RobustnessConfig {
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_retry_interval,
            current_interval: self.initial_retry_interval,
            max_interval: self.max_retry_interval,
            max_elapsed_time: Some(self.lock_timeout),
            ..ExponentialBackoff::default()
        }
    }
}

/// Read the complete contents of a regular file into memory.
///
/// The returned buffer is an independent snapshot: the file may be moved or
/// deleted afterwards without affecting it.
pub fn read_snapshot(path: &Path) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotAFile {
            path: path.to_path_buf(),
        },
        _ => Error::io(path, e),
    })?;
    if !metadata.is_file() {
        return Err(Error::NotAFile {
            path: path.to_path_buf(),
        });
    }

    let data = fs::read(path).map_err(|e| Error::io(path, e))?;
    tracing::trace!(path = %path.display(), bytes = data.len(), "Captured file snapshot");
    Ok(data)
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers never observe a partial file.
/// The advisory lock on the temp file is retried with exponential backoff.
pub fn write_atomic(path: &Path, content: &[u8], robustness: RobustnessConfig) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let result = write_locked(&temp_path, path, content, robustness)
        .and_then(|()| fs::rename(&temp_path, path).map_err(|e| Error::io(path, e)));

    if result.is_err() && temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            tracing::warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file");
        }
    }
    result
}

fn write_locked(
    temp_path: &Path,
    target: &Path,
    content: &[u8],
    robustness: RobustnessConfig,
) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    backoff::retry(robustness.backoff(), || {
        FileExt::try_lock_exclusive(&temp_file).map_err(backoff::Error::transient)
    })
    .map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;

    FileExt::unlock(&temp_file).map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}
