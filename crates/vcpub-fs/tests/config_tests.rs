use std::fs;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use vcpub_fs::{ConfigStore, Error};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    root: String,
    port: u16,
}

#[rstest]
#[case("settings.toml", "root = \"file:///srv/repo\"\nport = 22\n")]
#[case("settings.json", r#"{"root": "file:///srv/repo", "port": 22}"#)]
#[case("settings.yaml", "root: file:///srv/repo\nport: 22\n")]
#[case("settings.yml", "root: file:///srv/repo\nport: 22\n")]
fn test_load_detects_format(#[case] name: &str, #[case] content: &str) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(name);
    fs::write(&path, content).unwrap();

    let loaded: Sample = ConfigStore::new().load(&path).unwrap();
    assert_eq!(
        loaded,
        Sample {
            root: "file:///srv/repo".into(),
            port: 22
        }
    );
}

#[test]
fn test_load_unsupported_extension() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.ini");
    fs::write(&path, "root=x").unwrap();

    let result: vcpub_fs::Result<Sample> = ConfigStore::new().load(&path);
    assert!(matches!(result, Err(Error::UnsupportedFormat { extension }) if extension == "ini"));
}

#[test]
fn test_load_reports_parse_errors_with_format() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.toml");
    fs::write(&path, "root = ").unwrap();

    let err = ConfigStore::new().load::<Sample>(&path).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { ref format, .. } if format == "TOML"));
}

#[test]
fn test_save_then_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("settings.toml");
    let store = ConfigStore::new();
    let sample = Sample {
        root: "https://svn.example.com/repo/".into(),
        port: 2222,
    };

    store.save(&path, &sample).unwrap();
    let loaded: Sample = store.load(&path).unwrap();

    assert_eq!(loaded, sample);
}
