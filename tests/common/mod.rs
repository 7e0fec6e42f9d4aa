/*!
 * Common test utilities for the langie test suite
 */

use std::sync::Arc;
use std::time::Duration;

use langie::app_config::Config;
use langie::providers::{FlagCountry, RawLanguage};
use langie::translation::{CacheStore, TranslationEngine};
use langie::MockProvider;

/// Initialise test logging once, honouring RUST_LOG
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Configuration with short, easily observable delays
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.batching.initial_batch_delay_ms = 100;
    config.batching.followup_batch_delay_ms = 50;
    config.batching.max_wait_time_ms = 2000;
    config.batching.recently_queued_window_ms = 100;
    config
}

/// Engine talking to `mock` with `config`
pub fn engine_with_config(config: Config, mock: &MockProvider) -> TranslationEngine {
    init_logging();
    TranslationEngine::new(config, Arc::new(mock.clone()))
}

/// Engine talking to `mock` with the test configuration
pub fn engine_with(mock: &MockProvider) -> TranslationEngine {
    engine_with_config(test_config(), mock)
}

/// Engine with a durable store
pub fn engine_with_store(mock: &MockProvider, store: CacheStore) -> TranslationEngine {
    init_logging();
    TranslationEngine::with_store(test_config(), Arc::new(mock.clone()), Some(store))
}

/// Sleep on the tokio clock
pub async fn wait_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// A service language entry
pub fn raw_language(code: &str, name: &str, popularity: Option<f64>, flag: Option<&str>) -> RawLanguage {
    RawLanguage {
        code: code.to_string(),
        name: name.to_string(),
        native_name: name.to_string(),
        popularity,
        flag_country: flag.map(|f| FlagCountry::One(f.to_string())),
    }
}

/// A small language list resembling the service's
pub fn sample_languages() -> Vec<RawLanguage> {
    vec![
        raw_language("en", "English", Some(1.0), Some("gb,us")),
        raw_language("fr", "French", Some(0.8), Some("fr")),
        raw_language("sr", "Serbian", Some(0.3), Some("rs")),
        raw_language("sr-latn", "Serbian (Latin)", Some(0.3), Some("rs")),
        raw_language("sr-cyrl", "Serbian (Cyrillic)", Some(0.3), Some("rs")),
        raw_language("pt-br", "Portuguese (Brazil)", Some(0.6), Some("br")),
        raw_language("tlh", "Klingon", Some(0.01), None),
    ]
}
