/*!
 * Tests for the durable key-value store and cache persistence
 */

use langie::app_config::CacheConfig;
use langie::database::{DatabaseConnection, Repository, StoreLimits};
use langie::translation::{CacheKey, CacheStore, LanguageEntries};
use tempfile::TempDir;

fn file_config(dir: &TempDir) -> CacheConfig {
    CacheConfig {
        persist: true,
        database_path: Some(dir.path().join("langie.db")),
        ..CacheConfig::default()
    }
}

#[tokio::test]
async fn test_cacheStore_withFileDatabase_shouldSurviveReopen() {
    let dir = TempDir::new().unwrap();
    let mut entries = LanguageEntries::default();
    entries.ui.insert(CacheKey::new("Hello", "ui"), "Bonjour".to_string());

    {
        let store = CacheStore::open(&file_config(&dir)).unwrap();
        store.save_translations("fr", &entries).await.unwrap();
        store.save_interface_language("fr").unwrap();
    }

    let reopened = CacheStore::open(&file_config(&dir)).unwrap();
    assert_eq!(reopened.load_translations("fr").unwrap(), entries);
    assert_eq!(reopened.load_interface_language().unwrap().as_deref(), Some("fr"));
}

#[test]
fn test_repository_withExpiredItem_shouldReadAsAbsent() {
    let repository = Repository::new_in_memory().unwrap();
    let now = chrono::Utc::now().timestamp();

    repository.set_json_at("langie_old", &"value", Some(60), now - 120).unwrap();
    repository.set_json_at("langie_new", &"value", Some(60), now).unwrap();

    assert_eq!(repository.get_json::<String>("langie_old").unwrap(), None);
    assert_eq!(repository.get_json::<String>("langie_new").unwrap().as_deref(), Some("value"));
    assert_eq!(repository.stats().unwrap().items, 1);
}

#[test]
fn test_repository_overItemQuota_shouldEvictOldestFirst() {
    let limits = StoreLimits {
        max_items: 2,
        ..StoreLimits::default()
    };
    let repository = Repository::new(DatabaseConnection::new_in_memory().unwrap(), limits);
    let now = chrono::Utc::now().timestamp();

    repository.set_json_at("langie_a", &1, None, now - 30).unwrap();
    repository.set_json_at("langie_b", &2, None, now - 20).unwrap();
    repository.set_json_at("langie_c", &3, None, now - 10).unwrap();

    assert_eq!(repository.get_json::<i32>("langie_a").unwrap(), None);
    assert_eq!(repository.get_json::<i32>("langie_b").unwrap(), Some(2));
    assert_eq!(repository.get_json::<i32>("langie_c").unwrap(), Some(3));
}

#[test]
fn test_repository_withOversizedItem_shouldReject() {
    let limits = StoreLimits {
        max_size_bytes: 64,
        ..StoreLimits::default()
    };
    let repository = Repository::new(DatabaseConnection::new_in_memory().unwrap(), limits);

    let big = "x".repeat(200);
    assert!(repository.set_json("langie_big", &big, None).is_err());
    assert_eq!(repository.stats().unwrap().items, 0);
}

#[test]
fn test_repository_clear_withoutPattern_shouldKeepForeignKeys() {
    let repository = Repository::new_in_memory().unwrap();
    repository.set_json("langie_translations_fr", &"a", None).unwrap();
    repository.set_json("interface_language", &"fr", None).unwrap();
    repository.set_json("other_app", &"b", None).unwrap();

    assert_eq!(repository.clear(None).unwrap(), 1);
    assert_eq!(repository.clear(Some("other")).unwrap(), 1);
    assert_eq!(repository.get_json::<String>("interface_language").unwrap().as_deref(), Some("fr"));
}
