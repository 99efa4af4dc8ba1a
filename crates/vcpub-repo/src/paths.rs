//! Helpers for repository-relative paths.
//!
//! Repository paths use `/` separators and are relative to the repository
//! root; leading and trailing separators are insignificant.

/// Strip leading and trailing separators.
pub fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

/// Join a parent folder and a child name.
pub fn join(parent: &str, name: &str) -> String {
    let parent = normalize(parent);
    let name = normalize(name);
    match (parent.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{parent}/{name}"),
    }
}

/// Parent folder of a path; empty for top-level entries.
pub fn parent(path: &str) -> &str {
    let path = normalize(path);
    path.rfind('/').map_or("", |idx| &path[..idx])
}

/// Last segment of a path.
pub fn file_name(path: &str) -> &str {
    let path = normalize(path);
    path.rfind('/').map_or(path, |idx| &path[idx + 1..])
}

/// Every folder prefix of a path, shortest first, including the path itself.
///
/// `"a/b/c"` yields `"a"`, `"a/b"`, `"a/b/c"`.
pub fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    let path = normalize(path);
    path.match_indices('/')
        .map(move |(idx, _)| &path[..idx])
        .chain((!path.is_empty()).then_some(path))
}
