/*!
 * Tests for the in-memory translation cache and refused translations
 */

use langie::translation::{CacheKey, CacheUpdate, ErrorKey, ErrorRecords, LanguageEntries, LanguagePair, TranslationCache};

#[test]
fn test_cache_withUiAndGeneralContexts_shouldKeepStoresApart() {
    let cache = TranslationCache::new();
    let ui_key = CacheKey::new("Save", "ui");
    let doc_key = CacheKey::new("Save", "document");

    cache.store("fr", "ui", &ui_key, "Save", "Enregistrer");
    cache.store("fr", "document", &doc_key, "Save", "Sauvegarder");

    let snapshot = cache.snapshot("fr");
    assert_eq!(snapshot.ui.len(), 1);
    assert_eq!(snapshot.general.len(), 1);
    assert_eq!(cache.peek("fr", "ui", &ui_key).as_deref(), Some("Enregistrer"));
    assert_eq!(cache.peek("fr", "document", &doc_key).as_deref(), Some("Sauvegarder"));
    assert!(cache.peek("de", "ui", &ui_key).is_none());
}

#[test]
fn test_cache_get_shouldCountHitsAndMisses() {
    let cache = TranslationCache::new();
    let key = CacheKey::new("Hello", "ui");

    assert!(cache.get("fr", "ui", &key).is_none());
    cache.store("fr", "ui", &key, "Hello", "Bonjour");
    assert_eq!(cache.get("fr", "ui", &key).as_deref(), Some("Bonjour"));
    assert_eq!(cache.get("fr", "ui", &key).as_deref(), Some("Bonjour"));

    let stats = cache.stats();
    assert_eq!((stats.hits, stats.misses, stats.entries), (2, 1, 1));
    assert!((stats.hit_rate - 2.0 / 3.0).abs() < f64::EPSILON);
}

#[test]
fn test_cache_store_withSameValue_shouldNotifyOnce() {
    let cache = TranslationCache::new();
    let mut updates = cache.subscribe();
    let key = CacheKey::new("Hello", "ui");

    assert!(cache.store("fr", "ui", &key, "Hello", "Bonjour"));
    assert!(!cache.store("fr", "ui", &key, "Hello", "Bonjour"));

    match updates.try_recv() {
        Ok(CacheUpdate::Entry { language, translated, .. }) => {
            assert_eq!(language, "fr");
            assert_eq!(translated, "Bonjour");
        }
        other => panic!("unexpected update: {:?}", other),
    }
    assert!(updates.try_recv().is_err());
}

#[test]
fn test_cache_load_withExistingEntries_shouldKeepMemoryValues() {
    let cache = TranslationCache::new();
    let hello = CacheKey::new("Hello", "ui");
    let world = CacheKey::new("World", "ui");
    cache.store("fr", "ui", &hello, "Hello", "Salut");

    let mut persisted = LanguageEntries::default();
    persisted.ui.insert(hello.clone(), "Bonjour".to_string());
    persisted.ui.insert(world.clone(), "Monde".to_string());

    assert_eq!(cache.load("fr", persisted), 1);
    assert_eq!(cache.peek("fr", "ui", &hello).as_deref(), Some("Salut"));
    assert_eq!(cache.peek("fr", "ui", &world).as_deref(), Some("Monde"));
}

#[test]
fn test_cache_clear_shouldDropEntriesAndAnnounceLanguage() {
    let cache = TranslationCache::new();
    let key = CacheKey::new("Hello", "ui");
    cache.store("fr", "ui", &key, "Hello", "Bonjour");
    let mut updates = cache.subscribe();

    cache.clear(Some("de"));

    assert!(cache.is_empty());
    assert_eq!(cache.stats().hits, 0);
    assert_eq!(
        updates.try_recv().unwrap(),
        CacheUpdate::Cleared {
            language: Some("de".to_string())
        }
    );
}

#[test]
fn test_errorRecords_shouldBeScopedToPair() {
    let errors = ErrorRecords::new();
    let es_fr = LanguagePair::new("es", "fr");
    let auto_fr = LanguagePair::new("", "fr");

    errors.record(ErrorKey::new("Hola", "ui", &es_fr), "unsupported pair");

    assert!(errors.contains(&ErrorKey::new("Hola", "ui", &es_fr)));
    assert!(!errors.contains(&ErrorKey::new("Hola", "ui", &auto_fr)));
    assert!(!errors.contains(&ErrorKey::new("Hola", "article", &es_fr)));
    assert_eq!(
        errors.get(&ErrorKey::new("Hola", "ui", &es_fr)).as_deref(),
        Some("unsupported pair")
    );

    errors.clear();
    assert!(errors.is_empty());
}

#[test]
fn test_cacheKey_withSeparatorCollision_shouldDiffer() {
    assert_ne!(CacheKey::new("b", "a"), CacheKey::new("", "ab"));
    assert_ne!(CacheKey::new("Hello", "ui"), CacheKey::new("Hello", "article"));
    assert_eq!(CacheKey::new("Hello", "ui").to_string().len(), 12);
}
