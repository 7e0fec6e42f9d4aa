use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

use super::models::{LanguageQuery, LanguagesPayload, RawLanguage, TranslateRequest, TranslateResponse};
use super::Provider;
use crate::app_config::Config;
use crate::errors::ProviderError;

/// Maximum number of body characters kept in error messages
const ERROR_BODY_LIMIT: usize = 500;

/// HTTP client for the translation service
#[derive(Debug, Clone)]
pub struct HttpProvider {
    /// HTTP client for API requests
    client: Client,
    /// Base URL without trailing slash
    host: String,
    /// Optional API key
    api_key: Option<String>,
    /// Transport timeout, reported in timeout errors
    timeout_secs: u64,
}

impl HttpProvider {
    /// Create a new client for `host`
    pub fn new(host: impl Into<String>, api_key: Option<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            host: host.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout_secs,
        }
    }

    /// Create a client from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.translator_host.clone(),
            config.api_key.clone(),
            config.http.timeout_secs,
        )
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        Url::parse(&format!("{}/{}", self.host, path))
            .map_err(|e| ProviderError::RequestFailed(format!("Invalid URL for {}: {}", path, e)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key).header("X-Api-Key", key),
            None => builder,
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout {
                host: self.host.clone(),
                timeout_secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            ProviderError::ConnectionError(format!(
                "Failed to connect to translator at {}: {}",
                self.host, e
            ))
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }

    /// Read the body, turning non-2xx statuses into `ApiError`
    async fn read_body(&self, response: Response) -> Result<String, ProviderError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            let message: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            error!("Translator error response ({}): {}", status, message);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: if message.is_empty() {
                    status.canonical_reason().unwrap_or("unknown status").to_string()
                } else {
                    message
                },
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn translate(&self, request: &TranslateRequest) -> Result<TranslateResponse, ProviderError> {
        let url = self.endpoint("translate")?;
        debug!(
            "POST {} ({} items, {} -> {})",
            url,
            request.len(),
            if request.from.is_empty() { "auto" } else { &request.from },
            request.to
        );

        let response = self
            .authorize(self.client.post(url))
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let body = self.read_body(response).await?;
        serde_json::from_str::<TranslateResponse>(&body)
            .map_err(|e| ProviderError::ParseError(format!("{} (body: {})", e, truncate(&body))))
    }

    async fn languages(&self, query: &LanguageQuery) -> Result<Vec<RawLanguage>, ProviderError> {
        let mut url = self.endpoint("languages")?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        debug!("GET {}", url);

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let body = self.read_body(response).await?;
        let payload = serde_json::from_str::<LanguagesPayload>(&body)
            .map_err(|e| ProviderError::ParseError(format!("{} (body: {})", e, truncate(&body))))?;

        Ok(payload.into_languages())
    }

    fn host(&self) -> &str {
        &self.host
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= ERROR_BODY_LIMIT {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(ERROR_BODY_LIMIT).collect::<String>())
    }
}
