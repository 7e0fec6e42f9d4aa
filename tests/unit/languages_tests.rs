/*!
 * Tests for language list normalization and locale selection
 */

use langie::languages::{country_for_language, country_hint_from_locale, normalize_languages, pick_for_locale};

use crate::common::{raw_language, sample_languages};

#[test]
fn test_normalize_languages_withSampleList_shouldFilterSerbianAndUnpopular() {
    let list = normalize_languages(sample_languages(), 0.1);
    let codes: Vec<&str> = list.iter().map(|l| l.code.as_str()).collect();

    assert_eq!(codes, vec!["en", "fr", "sr-latn", "sr-cyrl", "pt-br"]);
}

#[test]
fn test_normalize_languages_withMissingPopularity_shouldKeepEntry() {
    let list = normalize_languages(vec![raw_language("eo", "Esperanto", None, None)], 0.5);

    assert_eq!(list.len(), 1);
    assert_eq!(list[0].flag_country, "eo");
}

#[test]
fn test_normalize_languages_withCommaSeparatedFlags_shouldKeepFirst() {
    let list = normalize_languages(sample_languages(), 0.0);
    assert_eq!(list[0].flag_country, "gb");
}

#[test]
fn test_pick_for_locale_withSerbianLocales_shouldPickScript() {
    let list = normalize_languages(sample_languages(), 0.1);

    assert_eq!(pick_for_locale(&list, "sr").unwrap().code, "sr-latn");
    assert_eq!(pick_for_locale(&list, "sr-Latn-RS").unwrap().code, "sr-latn");
    assert_eq!(pick_for_locale(&list, "sr-RS").unwrap().code, "sr-cyrl");
    assert_eq!(pick_for_locale(&list, "sr-Cyrl").unwrap().code, "sr-cyrl");
    assert_eq!(pick_for_locale(&list, "sh").unwrap().code, "sr-latn");
}

#[test]
fn test_pick_for_locale_withRegionalLocale_shouldMatchExactThenPrefix() {
    let list = normalize_languages(sample_languages(), 0.1);

    assert_eq!(pick_for_locale(&list, "fr-CA").unwrap().code, "fr");
    assert_eq!(pick_for_locale(&list, "en_GB").unwrap().code, "en");
    assert_eq!(pick_for_locale(&list, "pt-PT").unwrap().code, "pt-br");
    assert!(pick_for_locale(&list, "ja-JP").is_none());
    assert!(pick_for_locale(&list, "").is_none());
}

#[test]
fn test_country_for_language_withKnownCode_shouldUppercase() {
    let list = normalize_languages(sample_languages(), 0.1);

    assert_eq!(country_for_language(&list, "pt-br").as_deref(), Some("BR"));
    assert_eq!(country_for_language(&list, "en").as_deref(), Some("GB"));
    assert!(country_for_language(&list, "de").is_none());
}

#[test]
fn test_country_hint_from_locale_withVariousLocales_shouldFindRegion() {
    assert_eq!(country_hint_from_locale("sr-Latn-RS").as_deref(), Some("RS"));
    assert_eq!(country_hint_from_locale("en_gb").as_deref(), Some("GB"));
    assert!(country_hint_from_locale("fr").is_none());
    assert!(country_hint_from_locale("es-419").is_none());
}
