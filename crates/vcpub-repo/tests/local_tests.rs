//! Tests for the git-backed local transport

use bytes::Bytes;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use vcpub_repo::{
    Author, ConnectionParams, Connector, Credentials, Error, LocalConnector, LocalRepository,
    NodeKind, RepositoryUrl, Revision,
};

fn setup() -> (TempDir, RepositoryUrl) {
    let temp = TempDir::new().unwrap();
    let url = LocalRepository::init(&temp.path().join("repo")).unwrap();
    (temp, url)
}

fn params(url: &RepositoryUrl) -> ConnectionParams {
    ConnectionParams::new(url.clone(), Credentials::default())
}

fn commit_files(url: &RepositoryUrl, files: &[(&str, &str)]) -> Revision {
    let committer = LocalConnector.open_committer(&params(url)).unwrap();
    let mut editor = committer
        .open_commit_editor("test commit", &Author::default())
        .unwrap();
    for (path, content) in files {
        editor
            .add_file(path, Bytes::copy_from_slice(content.as_bytes()))
            .unwrap();
    }
    editor.finalize().unwrap().revision
}

#[test]
fn test_new_repository_is_at_revision_zero() {
    let (_temp, url) = setup();
    let reader = LocalConnector.open_reader(&params(&url)).unwrap();

    assert_eq!(reader.latest_revision().unwrap(), Revision::INITIAL);
    assert_eq!(reader.check_path("", None).unwrap(), NodeKind::Folder);
    assert_eq!(reader.check_path("org", None).unwrap(), NodeKind::None);
    assert!(reader.dir_entries("", None).unwrap().is_empty());
}

#[test]
fn test_init_refuses_existing_repository() {
    let (temp, _url) = setup();
    assert!(LocalRepository::init(&temp.path().join("repo")).is_err());
}

#[test]
fn test_each_commit_creates_one_revision() {
    let (_temp, url) = setup();

    let first = commit_files(&url, &[("org/a/1.0/a.jar", "one"), ("org/a/1.0/a.pom", "pom")]);
    let second = commit_files(&url, &[("org/a/1.1/a.jar", "two")]);

    assert_eq!(first, Revision::new(1));
    assert_eq!(second, Revision::new(2));

    let reader = LocalConnector.open_reader(&params(&url)).unwrap();
    assert_eq!(reader.latest_revision().unwrap(), Revision::new(2));
    assert_eq!(
        reader.check_path("org/a/1.1", Some(Revision::new(1))).unwrap(),
        NodeKind::None
    );
    assert_eq!(reader.check_path("org/a/1.1", None).unwrap(), NodeKind::Folder);
    assert_eq!(reader.check_path("/org/a/1.0/a.jar", None).unwrap(), NodeKind::File);
}

#[test]
fn test_read_file_at_revision() {
    let (_temp, url) = setup();
    commit_files(&url, &[("lib/a.jar", "old")]);
    commit_files(&url, &[("lib/a.jar", "new")]);

    let reader = LocalConnector.open_reader(&params(&url)).unwrap();
    assert_eq!(reader.read_bytes("lib/a.jar", Some(Revision::new(1))).unwrap(), b"old");
    assert_eq!(reader.read_bytes("lib/a.jar", None).unwrap(), b"new");

    let mut out = Vec::new();
    let n = reader.read_file("lib/a.jar", None, &mut out).unwrap();
    assert_eq!(n, 3);
}

#[test]
fn test_read_rejects_folders_and_missing_paths() {
    let (_temp, url) = setup();
    commit_files(&url, &[("lib/a.jar", "x")]);
    let reader = LocalConnector.open_reader(&params(&url)).unwrap();

    assert!(matches!(
        reader.read_bytes("lib", None),
        Err(Error::UnexpectedKind { found: NodeKind::Folder, .. })
    ));
    assert!(matches!(
        reader.read_bytes("lib/b.jar", None),
        Err(Error::PathNotFound { .. })
    ));
}

#[test]
fn test_dir_entries_and_info() {
    let (_temp, url) = setup();
    commit_files(&url, &[("lib/a.jar", "12345"), ("lib/sub/b.txt", "b")]);
    let reader = LocalConnector.open_reader(&params(&url)).unwrap();

    let mut entries = reader.dir_entries("lib", None).unwrap();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    let summary: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind, e.size)).collect();
    assert_eq!(
        summary,
        vec![("a.jar", NodeKind::File, 5), ("sub", NodeKind::Folder, 0)]
    );

    let info = reader.info("lib/a.jar", None).unwrap().unwrap();
    assert_eq!(info.size, 5);
    assert!(info.last_modified.is_some());
    assert!(reader.info("lib/missing", None).unwrap().is_none());
    assert!(matches!(
        reader.dir_entries("lib/a.jar", None),
        Err(Error::UnexpectedKind { .. })
    ));
}

#[test]
fn test_copy_file_reuses_historical_content() {
    let (_temp, url) = setup();
    let base = commit_files(&url, &[("m/LATEST/m.jar", "payload")]);

    let committer = LocalConnector.open_committer(&params(&url)).unwrap();
    let mut editor = committer.open_commit_editor("copy", &Author::default()).unwrap();
    editor.ensure_folder("m/2.0").unwrap();
    editor.copy_file("m/LATEST/m.jar", base, "m/2.0/m.jar").unwrap();
    editor.finalize().unwrap();

    let reader = LocalConnector.open_reader(&params(&url)).unwrap();
    assert_eq!(reader.read_bytes("m/2.0/m.jar", None).unwrap(), b"payload");
}

#[test]
fn test_no_such_revision() {
    let (_temp, url) = setup();
    let reader = LocalConnector.open_reader(&params(&url)).unwrap();
    let err = reader.check_path("", Some(Revision::new(3))).unwrap_err();
    assert!(matches!(err, Error::NoSuchRevision { latest, .. } if latest == Revision::INITIAL));
}

#[test]
fn test_concurrent_editor_is_out_of_date() {
    let (_temp, url) = setup();
    let committer = LocalConnector.open_committer(&params(&url)).unwrap();
    let mut stale = committer.open_commit_editor("stale", &Author::default()).unwrap();
    stale.add_file("a.txt", Bytes::from_static(b"a")).unwrap();

    commit_files(&url, &[("b.txt", "b")]);

    let err = stale.finalize().unwrap_err();
    assert!(matches!(err, Error::OutOfDate { .. }));
    let reader = LocalConnector.open_reader(&params(&url)).unwrap();
    assert_eq!(reader.check_path("a.txt", None).unwrap(), NodeKind::None);
}

#[test]
fn test_discarded_editor_leaves_no_revision() {
    let (_temp, url) = setup();
    let committer = LocalConnector.open_committer(&params(&url)).unwrap();
    let mut editor = committer.open_commit_editor("drop", &Author::default()).unwrap();
    editor.add_file("a.txt", Bytes::from_static(b"a")).unwrap();
    editor.discard().unwrap();

    let reader = LocalConnector.open_reader(&params(&url)).unwrap();
    assert_eq!(reader.latest_revision().unwrap(), Revision::INITIAL);
}

#[test]
fn test_open_from_nested_location_finds_root() {
    let (_temp, url) = setup();
    let nested = url.join_path("org/module/1.0").unwrap();
    let reader = LocalConnector.open_reader(&params(&nested)).unwrap();
    assert_eq!(reader.root(), &url.as_directory());
}

#[test]
fn test_open_without_repository_fails() {
    let temp = TempDir::new().unwrap();
    let url = RepositoryUrl::from_file_path(temp.path()).unwrap();
    assert!(matches!(
        LocalConnector.open_reader(&params(&url)),
        Err(Error::RepositoryNotFound { .. })
    ));
}
