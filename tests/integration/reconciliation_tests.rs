/*!
 * Integration tests for failure isolation, refused items and stale results
 */

use langie::providers::{TranslateResponse, TranslatedItem};
use langie::{MockProvider, TranslationError};
use serde_json::Value;
use std::time::Duration;

use crate::common::{engine_with, wait_ms};

/// Test that one failing pair does not affect the other pairs of a flush
#[tokio::test]
async fn test_flush_withOneFailingPair_shouldIsolateFailure() {
    let mock = MockProvider::working();
    mock.fail_pair("es", "fr");
    let engine = engine_with(&mock);
    engine.set_language("fr");

    engine.l("Hello", None);
    engine.lookup("Hola", None, Some("es"), None);

    let result = engine.flush_now().await;
    match result {
        Err(TranslationError::PartialFailure {
            failed_batches,
            total_batches,
            ..
        }) => assert_eq!((failed_batches, total_batches), (1, 2)),
        other => panic!("expected a partial failure, got {:?}", other),
    }

    assert_eq!(engine.l("Hello", None), "[fr] Hello");
    assert!(!engine.is_pending("Hola", "ui"));
    assert_eq!(engine.stats().error_records, 0);
}

/// Test that a key whose call failed can be requested again
#[tokio::test]
async fn test_lookup_afterTransportFailure_shouldRequeue() {
    let mock = MockProvider::working();
    mock.fail_pair("es", "fr");
    let engine = engine_with(&mock);
    engine.set_language("fr");

    engine.lookup("Hola", None, Some("es"), None);
    assert!(engine.flush_now().await.is_err());

    // Past the recently-queued window
    wait_ms(150).await;
    mock.heal_pair("es", "fr");

    assert_eq!(engine.lookup("Hola", None, Some("es"), None), "Hola");
    assert!(engine.is_pending("Hola", "ui"));
    engine.flush_now().await.unwrap();
    assert_eq!(engine.lookup("Hola", None, Some("es"), None), "[fr] Hola");
}

/// Test that refused items are remembered and not requested again
#[tokio::test]
async fn test_flush_withRefusedItem_shouldRecordErrorAndStopRequesting() {
    let mock = MockProvider::with_responder(|request| {
        Ok(TranslateResponse {
            translations: request
                .translations
                .iter()
                .map(|item| {
                    if item.text == "Bad" {
                        TranslatedItem::failed("untranslatable")
                    } else {
                        TranslatedItem::translated(format!("[{}] {}", request.to, item.text))
                    }
                })
                .collect(),
            error: None,
        })
    });
    let engine = engine_with(&mock);
    engine.set_language("fr");

    engine.l("Good", None);
    engine.l("Bad", None);
    let report = engine.flush_now().await.unwrap();
    assert_eq!((report.cached, report.refused), (1, 1));

    wait_ms(150).await;
    assert_eq!(engine.l("Bad", None), "Bad");
    assert_eq!(engine.stats().queued, 0);
    assert_eq!(engine.stats().error_records, 1);

    engine.clear_errors();
    engine.l("Bad", None);
    assert_eq!(engine.stats().queued, 1);
}

/// Test that a top-level error refuses the whole batch
#[tokio::test]
async fn test_flush_withTopLevelError_shouldRefuseEveryItem() {
    let mock = MockProvider::with_responder(|_| {
        Ok(TranslateResponse {
            translations: Vec::new(),
            error: Some(Value::String("rate limited".to_string())),
        })
    });
    let engine = engine_with(&mock);
    engine.set_language("fr");

    engine.l("Hello", None);
    engine.l("World", None);
    let report = engine.flush_now().await.unwrap();

    assert_eq!(report.refused, 2);
    assert_eq!(engine.stats().error_records, 2);
    assert_eq!(engine.l("Hello", None), "Hello");
}

/// Test that results equal to the source are not cached
#[tokio::test]
async fn test_flush_withEchoedText_shouldCountUnchanged() {
    let mock = MockProvider::echo();
    let engine = engine_with(&mock);
    engine.set_language("fr");

    engine.l("OK", None);
    let report = engine.flush_now().await.unwrap();

    assert_eq!((report.cached, report.unchanged), (0, 1));
    assert_eq!(engine.stats().cache.entries, 0);
    assert!(!engine.is_pending("OK", "ui"));
}

/// Test that a response arriving after a language switch is discarded
#[tokio::test]
async fn test_flush_withLanguageSwitchInFlight_shouldDiscardResult() {
    let mock = MockProvider::working().with_delay(Duration::from_millis(150));
    let engine = engine_with(&mock);
    engine.set_language("fr");

    engine.l("Hello", None);

    // Timer fires at ~100ms, the call is in flight until ~250ms
    wait_ms(150).await;
    assert_eq!(mock.call_count(), 1);
    engine.set_language("de");

    wait_ms(250).await;
    assert_eq!(engine.stats().cache.entries, 0);

    engine.set_language("fr");
    assert_eq!(engine.lr("Hello", None), "Hello");
}

/// Test that a transport failure of a scheduled flush keeps the engine usable
#[tokio::test]
async fn test_scheduledFlush_withFailingService_shouldReleaseKeys() {
    let mock = MockProvider::failing();
    let engine = engine_with(&mock);
    engine.set_language("fr");

    engine.l("Hello", None);
    wait_ms(250).await;

    assert_eq!(mock.call_count(), 1);
    assert!(!engine.is_pending("Hello", "ui"));
    assert_eq!(engine.l("Hello", None), "Hello");
}
