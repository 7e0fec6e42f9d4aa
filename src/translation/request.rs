/*!
 * Translation requests and their identifiers.
 */

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Identifier of a (text, context) combination
///
/// The key does not include the language pair: the cache is scoped per target
/// language, and the pending set deduplicates on the key alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key of `text` in `context`
    pub fn new(text: &str, context: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(context.as_bytes());
        // Unit separator keeps ("ab", "c") and ("a", "bc") apart
        hasher.update([0x1f]);
        hasher.update(text.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0[..self.0.len().min(12)])
    }
}

/// Source and target language of a request
///
/// An empty `from` asks the service to detect the source language.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub from: String,
    pub to: String,
}

impl LanguagePair {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = if self.from.is_empty() { "auto" } else { &self.from };
        write!(f, "{} -> {}", from, self.to)
    }
}

/// A text waiting to be translated
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    /// Source text
    pub text: String,
    /// Grouping tag, `ui` for interface strings
    pub context: String,
    /// Language pair the request is dispatched under
    pub pair: LanguagePair,
    /// Key derived from `text` and `context`
    pub cache_key: CacheKey,
    /// The caller pinned the target language instead of following the current one
    pub explicit_to_lang: bool,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        context: impl Into<String>,
        pair: LanguagePair,
        explicit_to_lang: bool,
    ) -> Self {
        let text = text.into();
        let context = context.into();
        let cache_key = CacheKey::new(&text, &context);

        Self {
            text,
            context,
            pair,
            cache_key,
            explicit_to_lang,
        }
    }
}
