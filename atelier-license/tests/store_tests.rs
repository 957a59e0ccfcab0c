mod common;

use atelier_license::{
    FileTrustStore, MemoryTrustStore, StoreError, TrustState, TrustStore,
};
use chrono::Duration;
use common::{activated_state, base_time, FOREIGN_FINGERPRINT};

// ── File store ───────────────────────────────────────────────────

#[test]
fn missing_file_loads_as_unactivated() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTrustStore::new(dir.path().join("trust.json"));
    assert_eq!(store.load().unwrap(), TrustState::unactivated());
}

#[test]
fn save_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileTrustStore::new(dir.path().join("trust.json"));

    let t0 = base_time();
    let state = activated_state(FOREIGN_FINGERPRINT, t0 + Duration::days(30), t0);
    store.save(&state).unwrap();

    assert_eq!(store.load().unwrap(), state);
}

#[test]
fn save_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("trust.json");
    let mut store = FileTrustStore::new(&path);

    store.save(&TrustState::unactivated()).unwrap();
    assert!(path.exists());
}

#[test]
fn save_replaces_previous_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileTrustStore::new(dir.path().join("trust.json"));

    let t0 = base_time();
    store
        .save(&activated_state(FOREIGN_FINGERPRINT, t0 + Duration::days(30), t0))
        .unwrap();
    store.save(&TrustState::unactivated()).unwrap();

    assert_eq!(store.load().unwrap(), TrustState::unactivated());
}

#[test]
fn corrupt_record_is_an_infrastructure_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trust.json");
    std::fs::write(&path, "{ not valid json").unwrap();

    let store = FileTrustStore::new(&path);
    assert!(matches!(
        store.load().unwrap_err(),
        StoreError::Serialization(_)
    ));
}

#[test]
fn store_reports_its_path() {
    let store = FileTrustStore::new("/tmp/atelier/trust.json");
    assert_eq!(store.path(), std::path::Path::new("/tmp/atelier/trust.json"));
}

// ── Memory store ─────────────────────────────────────────────────

#[test]
fn memory_store_starts_unactivated() {
    let store = MemoryTrustStore::new();
    assert_eq!(store.load().unwrap(), TrustState::unactivated());
}

#[test]
fn memory_store_roundtrip() {
    let mut store = MemoryTrustStore::new();
    let t0 = base_time();
    let state = activated_state(FOREIGN_FINGERPRINT, t0 + Duration::days(7), t0);
    store.save(&state).unwrap();
    assert_eq!(store.load().unwrap(), state);
}

// ── Record ───────────────────────────────────────────────────────

#[test]
fn default_record_is_unactivated() {
    assert_eq!(TrustState::default(), TrustState::unactivated());
    assert!(!TrustState::default().is_activated);
}

#[test]
fn record_serde_roundtrip() {
    let t0 = base_time();
    let state = activated_state(FOREIGN_FINGERPRINT, t0 + Duration::days(30), t0);
    let json = serde_json::to_string(&state).unwrap();
    let parsed: TrustState = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, state);
}
