//! Reads against a local git-backed repository

use std::fs;

use pretty_assertions::assert_eq;
use vcpub_core::{ArtifactRepository, Error, ModuleRevision, RepositoryConfig};
use vcpub_test_utils::repo::TestRepo;
use vcpub_test_utils::sources::SourceDir;

fn publish(repo: &TestRepo, sources: &SourceDir, revision: &str, content: &[u8]) {
    let mut publisher = ArtifactRepository::new(RepositoryConfig::new(repo.url_string())).unwrap();
    publisher
        .begin_publish_transaction(&ModuleRevision::new("acme", "b", revision))
        .unwrap();
    publisher
        .put(&sources.file("b.jar", content), &format!("a/{revision}/b.jar"), true)
        .unwrap();
    publisher.commit_publish_transaction().unwrap();
}

#[test]
fn test_round_trip_is_byte_identical() {
    let repo = TestRepo::new();
    let sources = SourceDir::new();
    let original = sources.binary("original.bin", 300_000, 42);
    let mut publisher = ArtifactRepository::new(RepositoryConfig::new(repo.url_string())).unwrap();

    publisher
        .begin_publish_transaction(&ModuleRevision::new("acme", "b", "1.0"))
        .unwrap();
    publisher.put(&original, "a/1.0/b.jar", true).unwrap();
    publisher.commit_publish_transaction().unwrap();

    let out = repo.scratch().join("b.jar");
    let bytes = publisher.get("a/1.0/b.jar", &out).unwrap();
    assert_eq!(bytes, 300_000);
    assert_eq!(fs::read(&out).unwrap(), fs::read(&original).unwrap());
}

#[test]
fn test_pinned_revision() {
    let repo = TestRepo::new();
    let sources = SourceDir::new();
    publish(&repo, &sources, "1.0", b"one");
    publish(&repo, &sources, "1.1", b"two");

    let mut config = RepositoryConfig::new(repo.url_string());
    config.retrieve_revision = Some(1);
    let reader = ArtifactRepository::new(config).unwrap();

    assert_eq!(reader.list("a").unwrap(), vec!["1.0", "LATEST"]);
    let out = repo.scratch().join("latest.jar");
    reader.get("a/LATEST/b.jar", &out).unwrap();
    assert_eq!(fs::read(&out).unwrap(), b"one");
}

#[test]
fn test_get_and_list_type_errors() {
    let repo = TestRepo::new();
    let sources = SourceDir::new();
    publish(&repo, &sources, "1.0", b"one");
    let reader = ArtifactRepository::new(RepositoryConfig::new(repo.url_string())).unwrap();
    let out = repo.scratch().join("out");

    assert!(matches!(reader.get("a/1.0", &out), Err(Error::NotAFile { .. })));
    assert!(matches!(reader.list("a/1.0/b.jar"), Err(Error::NotAFolder { .. })));
    assert!(matches!(reader.list("missing"), Err(Error::NotAFolder { .. })));
    assert!(!out.exists());
}

#[test]
fn test_resource_probe() {
    let repo = TestRepo::new();
    let sources = SourceDir::new();
    publish(&repo, &sources, "1.0", b"12345");
    let reader = ArtifactRepository::new(RepositoryConfig::new(repo.url_string())).unwrap();

    let resource = reader.get_resource("a/1.0/b.jar");
    assert!(resource.exists);
    assert_eq!(resource.size, 5);
    assert!(!reader.resolve_resource("a/2.0/b.jar").exists);
}

#[test]
fn test_unsupported_scheme_is_reported() {
    let reader =
        ArtifactRepository::new(RepositoryConfig::new("svn://svn.example.com/repo")).unwrap();
    let err = reader.list("").unwrap_err();
    assert!(matches!(
        err,
        Error::Repository(vcpub_repo::Error::UnsupportedScheme { .. })
    ));
    assert!(!reader.resolve_resource("a.jar").exists);
}
