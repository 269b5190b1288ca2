use std::fs;

use tempfile::TempDir;
use watcher_core::{ExtractionRules, NetworkExtractor};
use watcher_engine::{PersistError, SnapshotFile};

#[test]
fn missing_file_loads_as_none() {
    let temp = TempDir::new().unwrap();
    let file = SnapshotFile::new(temp.path().join("state.ron"));
    assert!(file.load().unwrap().is_none());
}

#[test]
fn save_replaces_previous_state() {
    let temp = TempDir::new().unwrap();
    let file = SnapshotFile::new(temp.path().join("nested").join("state.ron"));
    let extractor = NetworkExtractor::new(ExtractionRules::default()).unwrap();

    file.save(&extractor.accept_names(["Zora Network", "Base Chain"]))
        .unwrap();
    assert_eq!(
        file.load().unwrap().unwrap(),
        vec!["Base Chain".to_string(), "Zora Network".to_string()]
    );

    file.save(&extractor.accept_names(["Linea Mainnet"])).unwrap();
    assert_eq!(
        file.load().unwrap().unwrap(),
        vec!["Linea Mainnet".to_string()]
    );
    let leftovers = fs::read_dir(temp.path().join("nested")).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn hand_written_state_without_timestamp_loads() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.ron");
    fs::write(&path, r#"(networks: ["Base Chain", "Sonic Chain"])"#).unwrap();

    let names = SnapshotFile::new(&path).load().unwrap().unwrap();
    assert_eq!(names, vec!["Base Chain", "Sonic Chain"]);
}

#[test]
fn malformed_state_is_a_format_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("state.ron");
    fs::write(&path, "{{{").unwrap();

    assert!(matches!(
        SnapshotFile::new(&path).load(),
        Err(PersistError::Format(_))
    ));
}
