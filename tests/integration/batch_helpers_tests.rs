/*!
 * Integration tests for the imperative batch helpers
 */

use langie::providers::{TranslateResponse, TranslatedItem};
use langie::translation::BatchItem;
use langie::{MockProvider, ProviderError, TranslationError};
use serde_json::Value;

use crate::common::engine_with;

fn items(texts: &[(&str, &str)]) -> Vec<(String, String)> {
    texts
        .iter()
        .map(|(text, context)| (text.to_string(), context.to_string()))
        .collect()
}

/// Test that fetched translations are returned in order and cached
#[tokio::test]
async fn test_fetchAndCacheBatch_shouldReturnAndCacheTranslations() {
    let mock = MockProvider::working();
    let engine = engine_with(&mock);
    engine.set_language("fr");

    let result = engine
        .fetch_and_cache_batch(&items(&[("Hello", "ui"), ("Intro", "article")]), "en", "fr")
        .await
        .unwrap();

    assert_eq!(result, vec!["[fr] Hello", "[fr] Intro"]);
    assert_eq!(engine.lr("Hello", None), "[fr] Hello");
    assert_eq!(mock.call_count(), 1);
}

/// Test that a pinned target is cached even when it is not the current language
#[tokio::test]
async fn test_fetchAndCacheBatch_withOtherTarget_shouldNotDiscard() {
    let mock = MockProvider::working();
    let engine = engine_with(&mock);

    let result = engine
        .fetch_and_cache_batch(&items(&[("Hello", "ui")]), "", "de")
        .await
        .unwrap();

    assert_eq!(result, vec!["[de] Hello"]);
    assert_eq!(engine.lookup("Hello", None, None, Some("de")), "[de] Hello");
}

/// Test that an identical pair is answered without a call
#[tokio::test]
async fn test_fetchAndCacheBatch_withSamePair_shouldEchoWithoutCall() {
    let mock = MockProvider::working();
    let engine = engine_with(&mock);

    let result = engine
        .fetch_and_cache_batch(&items(&[("Hello", "ui")]), "fr", "FR")
        .await
        .unwrap();

    assert_eq!(result, vec!["Hello"]);
    assert_eq!(mock.call_count(), 0);
}

/// Test that service failures are reported to the caller
#[tokio::test]
async fn test_fetchAndCacheBatch_withFailures_shouldReturnErrors() {
    let failing = MockProvider::failing();
    let engine = engine_with(&failing);
    let result = engine.fetch_and_cache_batch(&items(&[("Hello", "ui")]), "en", "fr").await;
    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::ApiError { status_code: 500, .. }))
    ));

    let limited = MockProvider::with_responder(|_| {
        Ok(TranslateResponse {
            translations: Vec::new(),
            error: Some(Value::String("rate limited".to_string())),
        })
    });
    let engine = engine_with(&limited);
    let result = engine.fetch_and_cache_batch(&items(&[("Hello", "ui")]), "en", "fr").await;
    assert!(matches!(
        result,
        Err(TranslationError::Provider(ProviderError::ServiceError(ref m))) if m == "rate limited"
    ));
}

/// Test that refused items come back untranslated
#[tokio::test]
async fn test_fetchAndCacheBatch_withRefusedItem_shouldReturnSource() {
    let mock = MockProvider::with_responder(|request| {
        Ok(TranslateResponse {
            translations: request
                .translations
                .iter()
                .map(|item| match item.text.as_str() {
                    "Bad" => TranslatedItem::failed("untranslatable"),
                    text => TranslatedItem::translated(format!("<{}>", text)),
                })
                .collect(),
            error: None,
        })
    });
    let engine = engine_with(&mock);

    let result = engine
        .fetch_and_cache_batch(&items(&[("Good", "ui"), ("Bad", "ui")]), "en", "fr")
        .await
        .unwrap();

    assert_eq!(result, vec!["<Good>", "Bad"]);
    assert_eq!(engine.stats().error_records, 1);
}

/// Test that mixed pairs are sent one call per pair and keep input order
#[tokio::test]
async fn test_translateBatch_withMixedPairs_shouldKeepOrder() {
    let mock = MockProvider::working();
    let engine = engine_with(&mock);
    let mut batch = vec![
        BatchItem::new("Hello", "en", "fr"),
        BatchItem::new("Hola", "es", "de"),
        BatchItem::new("Same", "it", "IT"),
        BatchItem::new("World", "en", "fr"),
    ];
    batch[1].context = Some("article".to_string());

    let results = engine.translate_batch(&batch).await.unwrap();

    let translated: Vec<&str> = results.iter().map(|r| r.translated.as_str()).collect();
    assert_eq!(translated, vec!["[fr] Hello", "[de] Hola", "Same", "[fr] World"]);
    assert!(results.iter().all(|r| r.error.is_none()));

    let calls = mock.translate_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[1].context_of(0), Some("article"));

    // Nothing is cached
    assert_eq!(engine.stats().cache.entries, 0);
}

/// Test that empty input is rejected
#[tokio::test]
async fn test_batchHelpers_withEmptyInput_shouldReject() {
    let engine = engine_with(&MockProvider::working());

    assert!(matches!(engine.translate_batch(&[]).await, Err(TranslationError::EmptyBatch)));
    assert!(matches!(
        engine.fetch_and_cache_batch(&[], "en", "fr").await,
        Err(TranslationError::EmptyBatch)
    ));
}
