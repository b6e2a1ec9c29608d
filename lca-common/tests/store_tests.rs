//! JSON file store persistence tests

use lca_common::{JsonFileStore, Store};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Prefs {
    token: Option<String>,
    recent: Vec<String>,
}

#[test]
fn test_missing_file_starts_from_default() {
    let dir = tempfile::tempdir().unwrap();
    let store: JsonFileStore<Prefs> = JsonFileStore::open(dir.path().join("prefs.json"));
    assert_eq!(store.get(), Prefs::default());
}

#[test]
fn test_set_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("prefs.json");

    let store: JsonFileStore<Prefs> = JsonFileStore::open(&path);
    let prefs = Prefs {
        token: Some("abc".to_string()),
        recent: vec!["job-1".to_string()],
    };
    store.set(prefs.clone()).unwrap();

    let reopened: JsonFileStore<Prefs> = JsonFileStore::open(&path);
    assert_eq!(reopened.get(), prefs);
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn test_corrupt_file_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store: JsonFileStore<Prefs> = JsonFileStore::open(&path);
    assert_eq!(store.get(), Prefs::default());

    // Next write repairs the file
    store.set(Prefs { token: Some("t".into()), recent: vec![] }).unwrap();
    let reopened: JsonFileStore<Prefs> = JsonFileStore::open(&path);
    assert_eq!(reopened.get().token.as_deref(), Some("t"));
}

#[tokio::test]
async fn test_subscribers_observe_persisted_changes() {
    let dir = tempfile::tempdir().unwrap();
    let store: JsonFileStore<Prefs> = JsonFileStore::open(dir.path().join("prefs.json"));
    let mut rx = store.subscribe();

    store.set(Prefs { token: Some("x".into()), recent: vec![] }).unwrap();

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow().token.as_deref(), Some("x"));
}
