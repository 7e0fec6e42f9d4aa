/*!
 * Clients for the remote translation service.
 *
 * - `http`: reqwest-backed client for a real deployment
 * - `mock`: scripted in-process client for tests and offline use
 * - `models`: the JSON wire format shared by both
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

pub use self::http::HttpProvider;
pub use self::mock::MockProvider;
pub use self::models::{
    FlagCountry, LanguageQuery, RawLanguage, TranslateItem, TranslateRequest, TranslateResponse,
    TranslatedItem, UI_CONTEXT,
};

/// Common trait for translation service clients
///
/// The batching engine only ever talks to the service through this trait, so a
/// deployment can swap transports and tests can script responses.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Translate one language-pair batch
    ///
    /// # Returns
    /// * `Ok` with the decoded body, which may still carry a top-level or per-item error
    /// * `Err` for transport failures, non-2xx statuses and malformed JSON
    async fn translate(&self, request: &TranslateRequest) -> Result<TranslateResponse, ProviderError>;

    /// List the languages the service offers
    async fn languages(&self, query: &LanguageQuery) -> Result<Vec<RawLanguage>, ProviderError>;

    /// Base URL the client talks to
    fn host(&self) -> &str;
}

pub mod http;
pub mod mock;
pub mod models;
