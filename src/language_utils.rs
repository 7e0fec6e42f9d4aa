use anyhow::{anyhow, Result};
use isolang::Language;

/// Language utilities for language tag handling
///
/// The translation service speaks in lowercase tags such as `en`, `fr`,
/// `pt-br` or `sr-latn`. These helpers normalize tags and decide whether two
/// tags name the same language, bridging ISO 639-1 and ISO 639-2 codes for
/// bare primary subtags.
/// Map an ISO 639-2/B code onto its ISO 639-2/T counterpart
fn bibliographic_to_terminologic(code: &str) -> &str {
    match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        other => other,
    }
}

/// Lowercase and trim a tag, using `-` as the subtag separator
pub fn normalize_language_tag(tag: &str) -> String {
    tag.trim().to_lowercase().replace('_', "-")
}

/// The primary language subtag (`pt` for `pt-BR`)
pub fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or("").trim()
}

/// Check that a tag is well formed: a 2 or 3 letter primary subtag followed by
/// alphanumeric subtags
pub fn validate_language_tag(tag: &str) -> Result<()> {
    let normalized = normalize_language_tag(tag);
    if normalized.is_empty() {
        return Err(anyhow!("Language code must not be empty"));
    }

    let mut parts = normalized.split('-');
    let primary = parts.next().unwrap_or("");
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(anyhow!("Invalid language code: {}", tag));
    }

    for subtag in parts {
        if subtag.is_empty() || subtag.len() > 8 || !subtag.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(anyhow!("Invalid language code: {}", tag));
        }
    }

    Ok(())
}

/// Normalize a bare language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        let part2t = bibliographic_to_terminologic(&normalized_code);
        if Language::from_639_3(part2t).is_some() {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check whether two tags name the same language
///
/// Tags with region or script subtags must match exactly (`sr-latn` is not
/// `sr-cyrl`). Bare codes also match across ISO 639-1 and 639-2 (`fr`, `fra`, `fre`).
pub fn same_language(tag1: &str, tag2: &str) -> bool {
    let left = normalize_language_tag(tag1);
    let right = normalize_language_tag(tag2);

    if left == right {
        return true;
    }

    if left.contains('-') || right.contains('-') {
        return false;
    }

    match (normalize_to_part2t(&left), normalize_to_part2t(&right)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name for a tag's primary subtag
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(primary_subtag(code))?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}
