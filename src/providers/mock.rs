/*!
 * Mock provider implementation for testing.
 *
 * `MockProvider` simulates the translation service without any network:
 * - `MockProvider::working()` - Prefixes every text with `[to]`
 * - `MockProvider::failing()` - Always fails with an HTTP 500
 * - `MockProvider::with_responder(..)` - Fully scripted responses
 *
 * Every `translate` call is recorded so tests can assert on batching.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::models::{LanguageQuery, RawLanguage, TranslateRequest, TranslateResponse, TranslatedItem};
use super::Provider;
use crate::errors::ProviderError;

type Responder = dyn Fn(&TranslateRequest) -> Result<TranslateResponse, ProviderError> + Send + Sync;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with `[to] text`
    Working,
    /// Returns every text unchanged
    Echo,
    /// Always fails with an HTTP 500
    Failing,
    /// Answers with a body that is not the expected JSON shape
    Malformed,
}

/// Mock translation service
#[derive(Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    responder: Option<Arc<Responder>>,
    failing_pairs: Arc<Mutex<HashSet<(String, String)>>>,
    delay: Option<Duration>,
    languages: Arc<Mutex<Vec<RawLanguage>>>,
    translate_calls: Arc<Mutex<Vec<TranslateRequest>>>,
    language_calls: Arc<Mutex<Vec<LanguageQuery>>>,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("behavior", &self.behavior)
            .field("scripted", &self.responder.is_some())
            .field("delay", &self.delay)
            .field("translate_calls", &self.translate_calls.lock().len())
            .finish()
    }
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            responder: None,
            failing_pairs: Arc::new(Mutex::new(HashSet::new())),
            delay: None,
            languages: Arc::new(Mutex::new(Vec::new())),
            translate_calls: Arc::new(Mutex::new(Vec::new())),
            language_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that echoes input texts
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns undecodable bodies
    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    /// Create a mock driven by a custom responder
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&TranslateRequest) -> Result<TranslateResponse, ProviderError> + Send + Sync + 'static,
    {
        let mut mock = Self::working();
        mock.responder = Some(Arc::new(responder));
        mock
    }

    /// Delay every translate call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Serve this language list from `languages`
    pub fn with_languages(self, languages: Vec<RawLanguage>) -> Self {
        *self.languages.lock() = languages;
        self
    }

    /// Fail every call for the given language pair with an HTTP 500
    pub fn fail_pair(&self, from: &str, to: &str) {
        self.failing_pairs.lock().insert((from.to_string(), to.to_string()));
    }

    /// Stop failing the given language pair
    pub fn heal_pair(&self, from: &str, to: &str) {
        self.failing_pairs.lock().remove(&(from.to_string(), to.to_string()));
    }

    /// Recorded translate requests, in call order
    pub fn translate_calls(&self) -> Vec<TranslateRequest> {
        self.translate_calls.lock().clone()
    }

    /// Number of translate calls so far
    pub fn call_count(&self) -> usize {
        self.translate_calls.lock().len()
    }

    /// Recorded language list queries
    pub fn language_calls(&self) -> Vec<LanguageQuery> {
        self.language_calls.lock().clone()
    }

    /// Forget recorded calls
    pub fn reset_calls(&self) {
        self.translate_calls.lock().clear();
        self.language_calls.lock().clear();
    }

    fn respond(&self, request: &TranslateRequest) -> Result<TranslateResponse, ProviderError> {
        let pair = (request.from.clone(), request.to.clone());
        if self.failing_pairs.lock().contains(&pair) {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "Internal Server Error".to_string(),
            });
        }

        if let Some(responder) = &self.responder {
            return responder(request);
        }

        match self.behavior {
            MockBehavior::Working => Ok(TranslateResponse {
                translations: request
                    .translations
                    .iter()
                    .map(|item| TranslatedItem::translated(format!("[{}] {}", request.to, item.text)))
                    .collect(),
                error: None,
            }),
            MockBehavior::Echo => Ok(TranslateResponse::from_texts(
                request.translations.iter().map(|item| item.text.clone()),
            )),
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Internal Server Error".to_string(),
            }),
            MockBehavior::Malformed => Err(ProviderError::ParseError(
                "expected value at line 1 column 1 (body: <html>)".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn translate(&self, request: &TranslateRequest) -> Result<TranslateResponse, ProviderError> {
        self.translate_calls.lock().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.respond(request)
    }

    async fn languages(&self, query: &LanguageQuery) -> Result<Vec<RawLanguage>, ProviderError> {
        self.language_calls.lock().push(query.clone());

        if self.behavior == MockBehavior::Failing {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "Internal Server Error".to_string(),
            });
        }

        Ok(self.languages.lock().clone())
    }

    fn host(&self) -> &str {
        "mock://translator"
    }
}
