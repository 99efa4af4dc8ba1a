//! Tests for the in-memory transport

use bytes::Bytes;
use pretty_assertions::assert_eq;
use rstest::rstest;
use vcpub_repo::{
    Author, ConnectionParams, Connector, Credentials, Error, MemoryConnector, MemoryRepository,
    NodeKind, RepositoryUrl, Revision,
};

fn setup() -> (MemoryRepository, MemoryConnector, ConnectionParams) {
    let url = RepositoryUrl::parse("https://svn.example.com/repo").unwrap();
    let repository = MemoryRepository::new(url.clone());
    let connector = MemoryConnector::new(repository.clone());
    (repository, connector, ConnectionParams::new(url, Credentials::default()))
}

#[test]
fn test_folders_must_exist_before_files() {
    let (repository, connector, params) = setup();
    let committer = connector.open_committer(&params).unwrap();
    let mut editor = committer.open_commit_editor("m", &Author::default()).unwrap();
    editor.add_file("org/a.jar", Bytes::from_static(b"a")).unwrap();

    assert!(matches!(editor.finalize(), Err(Error::PathNotFound { .. })));
    assert_eq!(repository.latest_revision(), Revision::INITIAL);
}

#[test]
fn test_commit_records_message_and_counts_bytes() {
    let (repository, connector, params) = setup();
    let committer = connector.open_committer(&params).unwrap();
    let mut editor = committer.open_commit_editor("Publishing", &Author::default()).unwrap();
    editor.ensure_folder("org").unwrap();
    editor.add_file("org/a.jar", Bytes::from_static(b"abcd")).unwrap();
    let info = editor.finalize().unwrap();

    assert_eq!(info.revision, Revision::new(1));
    assert_eq!(info.changes, 2);
    assert_eq!(repository.message(info.revision).as_deref(), Some("Publishing"));
    assert_eq!(repository.transmitted_bytes(), 4);
    assert_eq!(repository.file("/org/a.jar").unwrap(), Bytes::from_static(b"abcd"));
    assert_eq!(repository.paths(), vec!["org", "org/a.jar"]);
}

#[test]
fn test_copy_counts_reference_not_bytes() {
    let (repository, connector, params) = setup();
    let base = repository.seed_file("m/LATEST/m.jar", &b"payload"[..]).unwrap();
    let before = repository.transmitted_bytes();

    let committer = connector.open_committer(&params).unwrap();
    let mut editor = committer.open_commit_editor("copy", &Author::default()).unwrap();
    editor.ensure_folder("m/1.0").unwrap();
    editor.copy_file("m/LATEST/m.jar", base, "m/1.0/m.jar").unwrap();
    editor.finalize().unwrap();

    assert_eq!(repository.transmitted_bytes(), before);
    assert_eq!(repository.copy_references(), 1);
    assert_eq!(repository.file("m/1.0/m.jar").unwrap(), Bytes::from_static(b"payload"));
}

#[test]
fn test_injected_write_failure() {
    let (repository, connector, params) = setup();
    repository.fail_writes_to("/org/bad.jar");
    let committer = connector.open_committer(&params).unwrap();
    let mut editor = committer.open_commit_editor("m", &Author::default()).unwrap();

    let err = editor.add_file("org/bad.jar", Bytes::from_static(b"x")).unwrap_err();
    assert!(matches!(err, Error::Transport { .. }));
}

#[rstest]
#[case::file_over_folder("org", "org")]
#[case::folder_over_file("org/a.jar", "org/a.jar/x")]
fn test_file_folder_conflicts(#[case] existing: &str, #[case] added: &str) {
    let (repository, connector, params) = setup();
    repository.seed_file("org/a.jar", &b"a"[..]).unwrap();
    let kind = connector.open_reader(&params).unwrap().check_path(existing, None).unwrap();
    assert!(kind.exists());

    let committer = connector.open_committer(&params).unwrap();
    let mut editor = committer.open_commit_editor("m", &Author::default()).unwrap();
    editor.add_file(added, Bytes::from_static(b"b")).unwrap();
    assert!(matches!(editor.finalize(), Err(Error::PathConflict { .. })));
}

#[test]
fn test_reader_sees_only_committed_state() {
    let (repository, connector, params) = setup();
    let reader = connector.open_reader(&params).unwrap();
    let committer = connector.open_committer(&params).unwrap();
    let mut editor = committer.open_commit_editor("m", &Author::default()).unwrap();
    editor.ensure_folder("org").unwrap();

    assert_eq!(reader.check_path("org", None).unwrap(), NodeKind::None);
    editor.finalize().unwrap();
    assert_eq!(reader.check_path("org", None).unwrap(), NodeKind::Folder);
    assert_eq!(
        reader.check_path("org", Some(Revision::INITIAL)).unwrap(),
        NodeKind::None
    );
    assert_eq!(repository.latest_revision(), Revision::new(1));
}

#[test]
fn test_stale_editor_is_out_of_date() {
    let (repository, connector, params) = setup();
    let committer = connector.open_committer(&params).unwrap();
    let mut stale = committer.open_commit_editor("m", &Author::default()).unwrap();
    stale.ensure_folder("a").unwrap();
    repository.seed_file("b.txt", &b"b"[..]).unwrap();

    assert!(matches!(stale.finalize(), Err(Error::OutOfDate { .. })));
}

#[test]
fn test_dir_entries_lists_immediate_children() {
    let (repository, connector, params) = setup();
    repository.seed_file("lib/a.jar", &b"aaa"[..]).unwrap();
    repository.seed_file("lib/sub/b.jar", &b"b"[..]).unwrap();
    let reader = connector.open_reader(&params).unwrap();

    let names: Vec<_> = reader
        .dir_entries("lib", None)
        .unwrap()
        .into_iter()
        .map(|e| (e.name, e.kind, e.size))
        .collect();
    assert_eq!(
        names,
        vec![
            ("a.jar".to_string(), NodeKind::File, 3),
            ("sub".to_string(), NodeKind::Folder, 0)
        ]
    );
}
