//! End-to-end publishing against a local git-backed repository
//!
//! Each scenario drives the caller-facing API and then inspects the
//! repository through a fresh connection, or through git directly.

use pretty_assertions::assert_eq;
use vcpub_core::{ArtifactRepository, Error, ModuleRevision, RepositoryConfig};
use vcpub_repo::{NodeKind, Revision};
use vcpub_test_utils::repo::TestRepo;
use vcpub_test_utils::sources::SourceDir;

fn open(repo: &TestRepo) -> ArtifactRepository {
    ArtifactRepository::new(RepositoryConfig::new(repo.url_string())).unwrap()
}

fn module(revision: &str) -> ModuleRevision {
    ModuleRevision::new("acme", "widgets", revision)
}

/// Commit messages on the revisions branch, newest first.
fn commit_messages(repo: &TestRepo) -> Vec<String> {
    let git = git2::Repository::open_bare(repo.path()).unwrap();
    let mut walk = git.revwalk().unwrap();
    walk.push_ref("refs/heads/main").unwrap();
    walk.map(|oid| {
        git.find_commit(oid.unwrap())
            .unwrap()
            .message()
            .unwrap_or_default()
            .to_string()
    })
    .collect()
}

#[test]
fn test_batch_lands_in_one_revision() {
    let repo = TestRepo::new();
    let sources = SourceDir::new();
    let mut publisher = open(&repo);

    publisher.begin_publish_transaction(&module("1.0")).unwrap();
    for name in ["widgets.jar", "widgets-sources.jar", "widgets.pom", "ivy.xml"] {
        let file = sources.file(name, name.as_bytes());
        publisher
            .put(&file, &format!("acme/widgets/1.0/{name}"), false)
            .unwrap();
    }
    let info = publisher.commit_publish_transaction().unwrap().unwrap();

    assert_eq!(info.revision, Revision::new(1));
    assert_eq!(repo.latest_revision(), Revision::new(1));
    assert_eq!(commit_messages(&repo), vec!["Publishing acme/widgets [1.0]"]);
    let mut listed = publisher.list("acme/widgets/1.0").unwrap();
    listed.sort();
    assert_eq!(
        listed,
        vec!["ivy.xml", "widgets-sources.jar", "widgets.jar", "widgets.pom"]
    );
}

#[test]
fn test_overwrite_denied_leaves_repository_unchanged() {
    let repo = TestRepo::new();
    let sources = SourceDir::new();
    let mut publisher = open(&repo);

    publisher.begin_publish_transaction(&module("1.0")).unwrap();
    publisher
        .put(&sources.file("a.jar", b"first"), "acme/widgets/1.0/a.jar", false)
        .unwrap();
    publisher.commit_publish_transaction().unwrap();

    publisher.begin_publish_transaction(&module("1.0")).unwrap();
    publisher
        .put(&sources.file("b.jar", b"b"), "acme/widgets/1.0/b.jar", false)
        .unwrap();
    publisher
        .put(&sources.file("a2.jar", b"second"), "acme/widgets/1.0/a.jar", false)
        .unwrap();
    let err = publisher.commit_publish_transaction().unwrap_err();

    assert!(matches!(err, Error::OverwriteDenied { .. }));
    assert_eq!(repo.latest_revision(), Revision::new(1));
    repo.assert_missing("acme/widgets/1.0/b.jar");
    repo.assert_file("acme/widgets/1.0/a.jar", b"first");
}

#[test]
fn test_binary_diff_second_publish_references_anchor() {
    let repo = TestRepo::new();
    let sources = SourceDir::new();
    let jar = sources.binary("widgets.jar", 64 * 1024, 11);
    let mut publisher = open(&repo);

    for revision in ["1.0", "1.1"] {
        publisher.begin_publish_transaction(&module(revision)).unwrap();
        publisher
            .put(&jar, &format!("acme/widgets/{revision}/widgets.jar"), false)
            .unwrap();
        publisher.commit_publish_transaction().unwrap();
    }

    let expected = std::fs::read(&jar).unwrap();
    repo.assert_file("acme/widgets/1.0/widgets.jar", &expected);
    repo.assert_file("acme/widgets/1.1/widgets.jar", &expected);
    repo.assert_file("acme/widgets/LATEST/widgets.jar", &expected);

    // A reference shares the stored object with the anchor.
    let git = git2::Repository::open_bare(repo.path()).unwrap();
    let tree = git.revparse_single("main^{tree}").unwrap().peel_to_tree().unwrap();
    let id = |path: &str| tree.get_path(std::path::Path::new(path)).unwrap().id();
    assert_eq!(id("acme/widgets/1.1/widgets.jar"), id("acme/widgets/LATEST/widgets.jar"));
}

#[test]
fn test_binary_diff_disabled_writes_no_anchor() {
    let repo = TestRepo::new();
    let sources = SourceDir::new();
    let mut config = RepositoryConfig::new(repo.url_string());
    config.binary_diff.enabled = false;
    let mut publisher = ArtifactRepository::new(config).unwrap();

    publisher.begin_publish_transaction(&module("1.0")).unwrap();
    publisher
        .put(&sources.file("a.jar", b"a"), "acme/widgets/1.0/a.jar", false)
        .unwrap();
    publisher.commit_publish_transaction().unwrap();

    assert_eq!(repo.kind("acme/widgets/LATEST"), NodeKind::None);
}

#[test]
fn test_abort_creates_no_revision() {
    let repo = TestRepo::new();
    let sources = SourceDir::new();
    let mut publisher = open(&repo);

    publisher.begin_publish_transaction(&module("1.0")).unwrap();
    publisher
        .put(&sources.file("a.jar", b"a"), "acme/widgets/1.0/a.jar", true)
        .unwrap();
    publisher.abort_publish_transaction();
    publisher.abort_publish_transaction();

    assert_eq!(repo.latest_revision(), Revision::INITIAL);
    repo.assert_missing("acme");
}

#[test]
fn test_explicit_repository_path() {
    let repo = TestRepo::new();
    let sources = SourceDir::new();
    let mut config = RepositoryConfig::new(repo.url().join_path("artifacts").unwrap().to_string());
    config.repository_path = Some(format!("{}artifacts", repo.url().path()));
    let mut publisher = ArtifactRepository::new(config).unwrap();

    publisher.begin_publish_transaction(&module("2.0")).unwrap();
    publisher
        .put(&sources.file("a.jar", b"a"), "acme/widgets/2.0/a.jar", false)
        .unwrap();
    publisher.commit_publish_transaction().unwrap();

    repo.assert_file("artifacts/acme/widgets/2.0/a.jar", b"a");
    repo.assert_file("artifacts/acme/widgets/LATEST/a.jar", b"a");
}
