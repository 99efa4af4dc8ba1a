//! Destination path decomposition
//!
//! Splits a destination into the repository root it lives under, the folder
//! path below that root and the file name. The resolver is stateless.

use vcpub_repo::RepositoryUrl;

use crate::{Error, Result};

const SEPARATOR: char = '/';

/// A destination split at the root boundary and at its last separator.
///
/// `root + folder + "/" + file_name` reproduces the resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Repository root, without a trailing separator
    pub root: String,
    /// Folder below the root with a leading separator, empty at the root
    pub folder: String,
    pub file_name: String,
}

impl ResolvedPath {
    /// The full destination path.
    pub fn full_path(&self) -> String {
        format!("{}{}/{}", self.root, self.folder, self.file_name)
    }

    /// Folder below the root without the leading separator.
    pub fn folder_path(&self) -> &str {
        self.folder.trim_start_matches(SEPARATOR)
    }

    /// Folder segments below the root, outermost first.
    pub fn folder_segments(&self) -> impl Iterator<Item = &str> {
        self.folder_path()
            .split(SEPARATOR)
            .filter(|segment| !segment.is_empty())
    }

    /// The same file with the innermost folder segment equal to `segment`
    /// replaced by `replacement`, keeping every segment after it.
    ///
    /// Returns `None` when no folder segment equals `segment`.
    pub fn with_folder_replaced(&self, segment: &str, replacement: &str) -> Option<ResolvedPath> {
        let mut segments: Vec<&str> = self.folder_segments().collect();
        let index = segments.iter().rposition(|s| *s == segment)?;
        segments[index] = replacement;
        Some(ResolvedPath {
            root: self.root.clone(),
            folder: segments.iter().map(|s| format!("/{s}")).collect(),
            file_name: self.file_name.clone(),
        })
    }
}

/// Parses destinations against an optional explicit repository root.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

impl PathResolver {
    /// Split `destination` into root, folder and file name.
    ///
    /// A destination containing `://` is parsed as a URL and its decoded path
    /// is resolved. With an explicit root the destination must start with it
    /// on a segment boundary; without one the first path segment is the root.
    pub fn resolve(destination: &str, explicit_root: Option<&str>) -> Result<ResolvedPath> {
        let path = if destination.contains("://") {
            RepositoryUrl::parse(destination)
                .map_err(|e| Error::invalid_path(destination, e.to_string()))?
                .path()
                .to_string()
        } else {
            destination.to_string()
        };

        if path.ends_with(SEPARATOR) {
            return Err(Error::invalid_path(
                destination,
                "destination names a folder, not a file",
            ));
        }

        let boundary = match explicit_root {
            Some(root) => {
                let root = root.trim_end_matches(SEPARATOR);
                let inside = path
                    .strip_prefix(root)
                    .is_some_and(|rest| rest.starts_with(SEPARATOR));
                if !inside {
                    return Err(Error::invalid_path(
                        destination,
                        format!("outside of repository root '{root}'"),
                    ));
                }
                root.len()
            }
            None => path
                .char_indices()
                .skip(1)
                .find(|&(_, c)| c == SEPARATOR)
                .map(|(idx, _)| idx)
                .ok_or_else(|| Error::invalid_path(destination, "no top-level folder"))?,
        };

        // The boundary sits on a separator.
        let last = path.rfind(SEPARATOR).unwrap_or(boundary);
        let folder = if last > boundary {
            path[boundary..last].to_string()
        } else {
            String::new()
        };
        let resolved = ResolvedPath {
            root: path[..boundary].to_string(),
            folder,
            file_name: path[last + 1..].to_string(),
        };
        tracing::trace!(
            destination,
            root = %resolved.root,
            folder = %resolved.folder,
            file = %resolved.file_name,
            "Resolved destination"
        );
        Ok(resolved)
    }

    /// Express `path` relative to the repository root path `root`.
    pub fn relative_to(path: &str, root: &str) -> Result<String> {
        let root = root.trim_end_matches(SEPARATOR);
        match path.strip_prefix(root) {
            Some(rest) if rest.is_empty() || rest.starts_with(SEPARATOR) => {
                Ok(rest.trim_matches(SEPARATOR).to_string())
            }
            _ => Err(Error::invalid_path(
                path,
                format!("outside of repository root '{root}/'"),
            )),
        }
    }
}
