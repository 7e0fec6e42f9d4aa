/*!
 * Tests for language tag utility functions
 */

use langie::language_utils::{
    get_language_name, normalize_language_tag, normalize_to_part2t, primary_subtag, same_language,
    validate_language_tag,
};

#[test]
fn test_normalize_language_tag_withMixedInput_shouldLowercaseAndDash() {
    assert_eq!(normalize_language_tag(" EN "), "en");
    assert_eq!(normalize_language_tag("pt_BR"), "pt-br");
    assert_eq!(normalize_language_tag("sr-Latn"), "sr-latn");
}

#[test]
fn test_primary_subtag_withRegion_shouldReturnLanguage() {
    assert_eq!(primary_subtag("pt-BR"), "pt");
    assert_eq!(primary_subtag("en_GB"), "en");
    assert_eq!(primary_subtag("fr"), "fr");
}

#[test]
fn test_validate_language_tag_withVariousTags_shouldValidateCorrectly() {
    assert!(validate_language_tag("en").is_ok());
    assert!(validate_language_tag("fil").is_ok());
    assert!(validate_language_tag("sr-Latn").is_ok());
    assert!(validate_language_tag("zh_Hant_TW").is_ok());

    assert!(validate_language_tag("").is_err());
    assert!(validate_language_tag("e").is_err());
    assert!(validate_language_tag("engl").is_err());
    assert!(validate_language_tag("12").is_err());
    assert!(validate_language_tag("en--us").is_err());
}

#[test]
fn test_normalize_to_part2t_withValidCodes_shouldNormalizeCorrectly() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("FR").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert!(normalize_to_part2t("xx").is_err());
}

#[test]
fn test_same_language_withEquivalentCodes_shouldMatch() {
    assert!(same_language("en", "EN"));
    assert!(same_language("en", "eng"));
    assert!(same_language("fre", "fr"));
    assert!(same_language("pt_br", "pt-BR"));
}

#[test]
fn test_same_language_withDifferentCodes_shouldNotMatch() {
    assert!(!same_language("en", "fr"));
    assert!(!same_language("pt", "pt-br"));
    assert!(!same_language("sr-latn", "sr-cyrl"));
    assert!(!same_language("", "fr"));
}

#[test]
fn test_get_language_name_withTags_shouldUsePrimarySubtag() {
    assert_eq!(get_language_name("en").unwrap(), "English");
    assert_eq!(get_language_name("fr-CA").unwrap(), "French");
    assert!(get_language_name("zz").is_err());
}
