//! Key store persistence tests

use std::fs;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use keygate::errors::KeygateError;
use keygate::storage::{KeyRecord, KeyStore, Outcome};

fn record(id: &str) -> KeyRecord {
    KeyRecord::new(
        id,
        "https://example.com/a",
        "https://ufly.monetizzy.com/abc",
        Utc::now(),
    )
}

fn insert(store: &KeyStore, id: &str) {
    store
        .mutate(|records| {
            records.push(record(id));
            Ok(Outcome::Changed(()))
        })
        .unwrap();
}

#[test]
fn test_missing_file_is_created_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("keys.json");

    let store = KeyStore::open(&path, true).unwrap();

    assert!(store.is_empty());
    let content = fs::read_to_string(&path).unwrap();
    let parsed: Vec<KeyRecord> = serde_json::from_str(&content).unwrap();
    assert!(parsed.is_empty());
}

#[test]
fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");

    let store = KeyStore::open(&path, true).unwrap();
    insert(&store, "a");
    insert(&store, "b");
    let before = store.snapshot();
    drop(store);

    let reopened = KeyStore::open(&path, true).unwrap();
    assert_eq!(reopened.snapshot(), before);
}

#[test]
fn test_file_uses_camel_case_fields() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");
    let store = KeyStore::open(&path, true).unwrap();
    insert(&store, "a");

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let entry = &raw[0];
    assert_eq!(entry["id"], "a");
    assert_eq!(entry["used"], false);
    assert!(entry["usedAt"].is_null());
    assert_eq!(entry["shortLink"], "https://ufly.monetizzy.com/abc");
    assert_eq!(entry["originalLink"], "https://example.com/a");
    assert!(entry["createdAt"].is_string());
}

#[test]
fn test_loads_existing_file_with_missing_created_at() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");
    fs::write(
        &path,
        r#"[
            {"id":"legacy","used":false,"usedAt":null,"shortLink":"s","originalLink":"o"},
            {"id":"dated","createdAt":"2024-01-02T03:04:05Z","used":true,
             "usedAt":"2024-01-02T04:00:00Z","shortLink":"s","originalLink":"o"}
        ]"#,
    )
    .unwrap();

    let store = KeyStore::open(&path, true).unwrap();

    assert!(store.get("legacy").unwrap().created_at.is_none());
    let dated = store.get("dated").unwrap();
    assert_eq!(
        dated.created_at,
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())
    );
    assert!(dated.used);
    let stats = store.stats();
    assert_eq!((stats.total, stats.used, stats.available), (2, 1, 1));
}

#[test]
fn test_corrupt_file_aborts_when_configured() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");
    fs::write(&path, "{ not json").unwrap();

    let err = KeyStore::open(&path, true).err().unwrap();

    assert!(matches!(err, KeygateError::Storage(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn test_corrupt_file_is_moved_aside() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");
    fs::write(&path, "{ not json").unwrap();

    let store = KeyStore::open(&path, false).unwrap();

    assert!(store.is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap().trim(), "[]");

    let quarantined: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("keys.json.corrupt-"))
        .collect();
    assert_eq!(quarantined.len(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join(&quarantined[0])).unwrap(),
        "{ not json"
    );
}

#[test]
fn test_failed_write_leaves_memory_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");
    let store = KeyStore::open(&path, true).unwrap();
    insert(&store, "a");

    // a directory at the temp path makes the next write fail
    fs::create_dir(dir.path().join("keys.json.tmp")).unwrap();

    let result = store.mutate(|records| {
        records.push(record("b"));
        Ok(Outcome::Changed(()))
    });

    assert!(matches!(result, Err(KeygateError::Storage(_))));
    assert_eq!(store.len(), 1);
    assert!(store.get("b").is_none());
    let on_disk: Vec<KeyRecord> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk.len(), 1);
}

#[test]
fn test_flush_rewrites_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");
    let store = KeyStore::open(&path, true).unwrap();
    insert(&store, "a");

    fs::remove_file(&path).unwrap();
    store.flush().unwrap();

    let on_disk: Vec<KeyRecord> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, store.snapshot());
}

#[test]
fn test_read_only_leaves_corrupt_file_in_place() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");
    fs::write(&path, "{ not json").unwrap();

    let err = KeyStore::read_only(&path).unwrap_err();

    assert!(matches!(err, KeygateError::Storage(_)));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_read_only_does_not_create_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");

    let records = KeyStore::read_only(&path).unwrap();

    assert!(records.is_empty());
    assert!(!path.exists());
}

#[test]
fn test_read_only_sees_persisted_records() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.json");
    let store = KeyStore::open(&path, true).unwrap();
    insert(&store, "a");

    assert_eq!(KeyStore::read_only(&path).unwrap(), store.snapshot());
}

#[test]
fn test_temp_file_keeps_full_file_name() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keys.db");
    let store = KeyStore::open(&path, true).unwrap();

    // blocking `keys.db.tmp` must make the write fail
    fs::create_dir(dir.path().join("keys.db.tmp")).unwrap();
    let result = store.mutate(|records| {
        records.push(record("a"));
        Ok(Outcome::Changed(()))
    });

    assert!(matches!(result, Err(KeygateError::Storage(_))));
    assert!(!dir.path().join("keys.json.tmp").exists());
    assert!(store.is_empty());
}
