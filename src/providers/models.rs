/*!
 * Wire models of the translation service.
 *
 * `POST {host}/translate` takes a [`TranslateRequest`] and answers with a
 * [`TranslateResponse`] whose items are positionally aligned with the request.
 * `GET {host}/languages` answers with either a bare array or `{ "languages": [...] }`.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Context hoisted to the batch level when every item shares it
pub const UI_CONTEXT: &str = "ui";

/// Single text sent for translation
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TranslateItem {
    /// Source text
    pub text: String,

    /// Per-item context, omitted when hoisted to `ctx`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Body of `POST /translate`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TranslateRequest {
    /// Items to translate, in dispatch order
    pub translations: Vec<TranslateItem>,

    /// Source language, empty for auto-detection
    pub from: String,

    /// Target language
    pub to: String,

    /// Batch-level context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<String>,
}

impl TranslateRequest {
    /// Build a request for one language pair
    ///
    /// When every item carries the `ui` context the context is sent once as
    /// `ctx` instead of being repeated per item.
    pub fn new<I, T, C>(from: impl Into<String>, to: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: Into<String>,
    {
        let items: Vec<(String, String)> = items
            .into_iter()
            .map(|(text, context)| (text.into(), context.into()))
            .collect();

        let hoist = !items.is_empty() && items.iter().all(|(_, context)| context == UI_CONTEXT);

        let translations = items
            .into_iter()
            .map(|(text, context)| TranslateItem {
                text,
                context: if hoist { None } else { Some(context) },
            })
            .collect();

        Self {
            translations,
            from: from.into(),
            to: to.into(),
            ctx: hoist.then(|| UI_CONTEXT.to_string()),
        }
    }

    /// Number of items in the request
    pub fn len(&self) -> usize {
        self.translations.len()
    }

    /// Whether the request carries no items
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// Effective context of the item at `index`
    pub fn context_of(&self, index: usize) -> Option<&str> {
        self.translations
            .get(index)
            .and_then(|item| item.context.as_deref().or(self.ctx.as_deref()))
    }
}

/// Body of a `POST /translate` response
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct TranslateResponse {
    /// Results, positionally aligned with the request items
    #[serde(default)]
    pub translations: Vec<TranslatedItem>,

    /// Whole-request failure (rate limiting and the like)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl TranslateResponse {
    /// Successful response built from translated strings
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            translations: texts.into_iter().map(TranslatedItem::translated).collect(),
            error: None,
        }
    }

    /// Top-level error message, if the service reported one
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().and_then(error_value_message)
    }
}

/// One result item
///
/// The service puts the translation in `text`; older deployments answer with
/// `{ "text": <original>, "translated": <translation> }` or a terse `t`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct TranslatedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Detected or echoed source language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Context echoed by the service, never trusted for cache placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Per-item failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl TranslatedItem {
    /// Item carrying a translation
    pub fn translated(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Item reporting a failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(Value::String(message.into())),
            ..Default::default()
        }
    }

    /// Item carrying only a detected source language
    pub fn detected(from: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            ..Default::default()
        }
    }

    /// The translated text, preferring explicit `translated`/`t` fields over `text`
    pub fn translated_text(&self) -> Option<&str> {
        self.translated
            .as_deref()
            .or(self.t.as_deref())
            .or(self.text.as_deref())
    }

    /// Per-item error message, if any
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().and_then(error_value_message)
    }
}

fn error_value_message(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| Some(value.to_string())),
        other => Some(other.to_string()),
    }
}

/// Hints sent with `GET /languages`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageQuery {
    pub country: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub region: Option<String>,
}

impl LanguageQuery {
    /// Query pairs in a stable order, skipping unset hints
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("country", self.country.as_deref()),
            ("language", self.language.as_deref()),
            ("timezone", self.timezone.as_deref()),
            ("region", self.region.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.filter(|v| !v.is_empty()).map(|v| (name, v)))
        .collect()
    }
}

/// `flag_country` arrives either as a comma separated string or a list
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum FlagCountry {
    One(String),
    Many(Vec<String>),
}

impl FlagCountry {
    /// First listed country
    pub fn first(&self) -> Option<&str> {
        match self {
            FlagCountry::One(s) => s.split(',').map(str::trim).find(|c| !c.is_empty()),
            FlagCountry::Many(list) => list.iter().map(|c| c.trim()).find(|c| !c.is_empty()),
        }
    }
}

/// Language descriptor as sent by the service
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawLanguage {
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub native_name: String,

    #[serde(default)]
    pub popularity: Option<f64>,

    #[serde(default)]
    pub flag_country: Option<FlagCountry>,
}

/// Body of a `GET /languages` response
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LanguagesPayload {
    List(Vec<RawLanguage>),
    Wrapped {
        #[serde(default)]
        languages: Vec<RawLanguage>,
    },
}

impl LanguagesPayload {
    pub fn into_languages(self) -> Vec<RawLanguage> {
        match self {
            LanguagesPayload::List(list) => list,
            LanguagesPayload::Wrapped { languages } => languages,
        }
    }
}
