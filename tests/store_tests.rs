//! Integration tests for the file-backed history store.

use navquill::model::{EditorKind, ResourceDescriptor, ResourceId};
use navquill::store::{
    decode_entries, encode_entries, FileHistoryStore, HistoryStore, PersistedEntry, StorageScope,
    HISTORY_STORAGE_KEY,
};
use tempfile::TempDir;

fn res(s: &str) -> ResourceId {
    ResourceId::parse(s).unwrap()
}

#[test]
fn test_store_and_get_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut store = FileHistoryStore::new(dir.path().to_path_buf());

    let entries = vec![
        PersistedEntry {
            editor: ResourceDescriptor::with_kind(res("file:///a.rs"), EditorKind::new("text")),
        },
        PersistedEntry {
            editor: ResourceDescriptor::new(res("remote://host/b.rs")),
        },
    ];
    let payload = encode_entries(&entries).unwrap();
    store
        .store(HISTORY_STORAGE_KEY, payload, StorageScope::Workspace)
        .unwrap();

    let loaded = store
        .get(HISTORY_STORAGE_KEY, StorageScope::Workspace)
        .unwrap();
    assert_eq!(decode_entries(&loaded), entries);
}

#[test]
fn test_scopes_are_independent() {
    let dir = TempDir::new().unwrap();
    let mut store = FileHistoryStore::new(dir.path().to_path_buf());

    store
        .store("k", "workspace-value".to_string(), StorageScope::Workspace)
        .unwrap();
    store
        .store("k", "profile-value".to_string(), StorageScope::Profile)
        .unwrap();

    assert_eq!(
        store.get("k", StorageScope::Workspace).as_deref(),
        Some("workspace-value")
    );
    assert_eq!(
        store.get("k", StorageScope::Profile).as_deref(),
        Some("profile-value")
    );
}

#[test]
fn test_missing_key_is_none() {
    let dir = TempDir::new().unwrap();
    let store = FileHistoryStore::new(dir.path().to_path_buf());
    assert_eq!(store.get("unset", StorageScope::Workspace), None);
}

#[test]
fn test_store_survives_reload() {
    let dir = TempDir::new().unwrap();
    {
        let mut store = FileHistoryStore::new(dir.path().to_path_buf());
        store
            .store("k", "kept".to_string(), StorageScope::Workspace)
            .unwrap();
    }
    let store = FileHistoryStore::new(dir.path().to_path_buf());
    assert_eq!(
        store.get("k", StorageScope::Workspace).as_deref(),
        Some("kept")
    );
}

#[test]
fn test_corrupt_file_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("workspace.json"), "{ not json").unwrap();

    let store = FileHistoryStore::new(dir.path().to_path_buf());
    assert_eq!(store.get("k", StorageScope::Workspace), None);
}

#[test]
fn test_store_keeps_other_keys() {
    let dir = TempDir::new().unwrap();
    let mut store = FileHistoryStore::new(dir.path().to_path_buf());

    store
        .store("first", "1".to_string(), StorageScope::Workspace)
        .unwrap();
    store
        .store("second", "2".to_string(), StorageScope::Workspace)
        .unwrap();

    assert_eq!(store.get("first", StorageScope::Workspace).as_deref(), Some("1"));
    assert_eq!(store.get("second", StorageScope::Workspace).as_deref(), Some("2"));
}
