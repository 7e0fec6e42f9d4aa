/*!
 * Error types.
 *
 * `ProviderError` covers one exchange with the translation service.
 * `TranslationError` is what the engine's fallible operations return.
 * Binary-level plumbing uses `anyhow`.
 */

use thiserror::Error;

/// Failure of a single exchange with the translation service
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The request could not be built or sent
    #[error("Translation request failed: {0}")]
    RequestFailed(String),

    /// The body was not the JSON shape we expect
    #[error("Unreadable translation response: {0}")]
    ParseError(String),

    /// Non-2xx status
    #[error("Translation service returned {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Cannot reach translation service: {0}")]
    ConnectionError(String),

    #[error("Request to {host} timed out after {timeout_secs} seconds")]
    Timeout { host: String, timeout_secs: u64 },

    /// Top-level `{ "error": ... }` in an otherwise valid body
    #[error("Translation service error: {0}")]
    ServiceError(String),
}

impl ProviderError {
    /// Whether the failure happened before the service could answer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::Timeout { .. }
        )
    }
}

#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The imperative batch helpers require at least one item
    #[error("translations must be a non-empty array")]
    EmptyBatch,

    /// Some language-pair sub-batches of a flush failed
    #[error("{failed_batches} of {total_batches} translation batches failed: {first_error}")]
    PartialFailure {
        failed_batches: usize,
        total_batches: usize,
        first_error: ProviderError,
    },
}
