/*!
 * Available language list handling.
 *
 * The service's `/languages` answer is normalized into [`LanguageDescriptor`]s:
 * `flag_country` collapses to its first entry (falling back to the code),
 * Serbian is narrowed to its Latin and Cyrillic script variants, and rarely
 * used languages are filtered out by popularity.
 */

use serde::{Deserialize, Serialize};

use crate::language_utils::{normalize_language_tag, primary_subtag};
use crate::providers::RawLanguage;

/// Serbian variants offered to users
const SERBIAN_LATIN: &str = "sr-latn";
const SERBIAN_CYRILLIC: &str = "sr-cyrl";

/// A selectable language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDescriptor {
    /// Language code as used in translate calls
    pub code: String,
    /// English name
    pub name: String,
    /// Name in the language itself
    pub native_name: String,
    /// Relative popularity, when the service reports one
    #[serde(default)]
    pub popularity: Option<f64>,
    /// Country whose flag represents the language
    pub flag_country: String,
}

impl From<RawLanguage> for LanguageDescriptor {
    fn from(raw: RawLanguage) -> Self {
        let flag_country = raw
            .flag_country
            .as_ref()
            .and_then(|flag| flag.first())
            .map(str::to_string)
            .unwrap_or_else(|| raw.code.clone());

        Self {
            code: raw.code,
            name: raw.name,
            native_name: raw.native_name,
            popularity: raw.popularity,
            flag_country,
        }
    }
}

/// Normalize the raw list, keeping service order
pub fn normalize_languages(raw: Vec<RawLanguage>, min_popularity: f64) -> Vec<LanguageDescriptor> {
    raw.into_iter()
        .map(LanguageDescriptor::from)
        .filter(|lang| {
            if primary_subtag(&lang.code) == "sr" {
                return lang.code == SERBIAN_LATIN || lang.code == SERBIAN_CYRILLIC;
            }
            true
        })
        .filter(|lang| lang.popularity.is_none_or(|p| p >= min_popularity))
        .collect()
}

/// Pick the language matching a browser-style locale such as `fr-CA` or `sr-Latn-RS`
///
/// Serbian locales map onto a script variant (`sr` alone reads as Latin) and
/// `sh` reads as Serbian Latin. Other locales match their primary subtag
/// exactly first, then as a code prefix.
pub fn pick_for_locale<'a>(languages: &'a [LanguageDescriptor], locale: &str) -> Option<&'a LanguageDescriptor> {
    let locale = normalize_language_tag(locale);
    let browser_code = primary_subtag(&locale);
    if browser_code.is_empty() {
        return None;
    }

    match browser_code {
        "sr" => {
            let target = if locale == "sr" || locale.contains("latn") {
                SERBIAN_LATIN
            } else {
                SERBIAN_CYRILLIC
            };
            languages.iter().find(|l| l.code == target)
        }
        "sh" => languages
            .iter()
            .find(|l| l.code == SERBIAN_LATIN)
            .or_else(|| languages.iter().find(|l| l.code.starts_with("sr"))),
        code => languages
            .iter()
            .find(|l| l.code == code)
            .or_else(|| languages.iter().find(|l| l.code.starts_with(code))),
    }
}

/// Upper-cased flag country of `code`, if the language is listed
pub fn country_for_language(languages: &[LanguageDescriptor], code: &str) -> Option<String> {
    languages
        .iter()
        .find(|l| l.code == code)
        .map(|l| l.flag_country.to_uppercase())
        .filter(|c| !c.is_empty())
}

/// Region subtag of a locale (`RS` for `sr-Latn-RS`, `GB` for `en_GB`)
pub fn country_hint_from_locale(locale: &str) -> Option<String> {
    locale
        .split(['-', '_'])
        .skip(1)
        .find(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_uppercase)
}
